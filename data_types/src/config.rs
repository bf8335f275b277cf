use chrono::Duration;

use crate::compaction_state::{DimensionsSpec, GranularitySpec, IndexSpec, MetricSpec, PartitionsSpec};

/// A datasource's declared compaction policy: the target state the
/// needs-compaction predicate diffs candidate segments against, and the
/// size/time-skip knobs the search-window builder uses.
///
/// Every field beyond `input_segment_size_bytes` and
/// `skip_offset_from_latest` is optional: an absent field means "do not
/// constrain on this dimension" per the data model.
#[derive(Debug, Clone)]
pub struct CompactionConfig {
    pub input_segment_size_bytes: u64,
    pub skip_offset_from_latest: Duration,
    pub granularity_spec: Option<GranularitySpec>,
    pub dimensions_spec: Option<DimensionsSpec>,
    pub transform_spec: Option<serde_json::Value>,
    pub metrics_spec: Option<Vec<MetricSpec>>,
    pub index_spec: Option<IndexSpec>,
    pub partitions_spec: Option<PartitionsSpec>,
    pub max_rows_per_segment: Option<u64>,
    pub max_total_rows: Option<u64>,
}

impl CompactionConfig {
    /// The partitions spec the needs-compaction predicate actually diffs
    /// against: the operator's explicit spec if declared, otherwise a
    /// dynamic spec built from `max_rows_per_segment`/`max_total_rows`.
    pub fn effective_partitions_spec(&self) -> PartitionsSpec {
        self.partitions_spec.clone().unwrap_or_else(|| {
            PartitionsSpec::dynamic(self.max_rows_per_segment, self.max_total_rows)
        })
    }

    /// The index spec the needs-compaction predicate diffs against: the
    /// operator's explicit spec if declared, otherwise the default.
    pub fn effective_index_spec(&self) -> IndexSpec {
        self.index_spec.unwrap_or_default()
    }
}
