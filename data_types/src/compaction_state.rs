use serde::{Deserialize, Serialize};

use crate::granularity::GranularityValue;

/// How an operator wants rows grouped into partitions within a time-chunk.
///
/// `Dynamic` is what the planner builds itself from
/// [`CompactionConfig::max_rows_per_segment`](crate::CompactionConfig) and
/// `max_total_rows` when the operator hasn't declared an explicit spec; the
/// other variants only ever arrive from a decoded
/// [`LastCompactionState`] or an operator-declared
/// [`CompactionConfig::partitions_spec`](crate::CompactionConfig).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartitionsSpec {
    Dynamic {
        max_rows_per_segment: Option<u64>,
        max_total_rows: Option<u64>,
    },
    Hashed {
        num_shards: Option<u32>,
        partition_dimensions: Vec<String>,
    },
    Range {
        max_rows_per_segment: Option<u64>,
        partition_dimensions: Vec<String>,
    },
}

impl PartitionsSpec {
    pub fn dynamic(max_rows_per_segment: Option<u64>, max_total_rows: Option<u64>) -> Self {
        Self::Dynamic {
            max_rows_per_segment,
            max_total_rows,
        }
    }

    /// Normalize the "unbounded" representation of `Dynamic.max_total_rows`
    /// so that an absent field compares equal to an explicit unbounded
    /// sentinel, per the needs-compaction predicate's rule for dynamic
    /// partitions specs.
    pub fn normalized(&self) -> PartitionsSpec {
        match self {
            PartitionsSpec::Dynamic {
                max_rows_per_segment,
                max_total_rows,
            } => PartitionsSpec::Dynamic {
                max_rows_per_segment: *max_rows_per_segment,
                max_total_rows: Some(max_total_rows.unwrap_or(u64::MAX)),
            },
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitmapEncoding {
    Roaring,
    Concise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    Lz4,
    Lzf,
    Uncompressed,
}

/// How segment indexes are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub bitmap_encoding: BitmapEncoding,
    pub dimension_compression: Compression,
    pub metric_compression: Compression,
}

impl Default for IndexSpec {
    fn default() -> Self {
        Self {
            bitmap_encoding: BitmapEncoding::Roaring,
            dimension_compression: Compression::Lz4,
            metric_compression: Compression::Lz4,
        }
    }
}

/// The time-bucketing knobs an operator can declare: the target segment
/// granularity, the query-time granularity rows are pre-aggregated to, and
/// whether rollup is enabled. Each is independently optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GranularitySpec {
    pub segment_granularity: Option<GranularityValue>,
    pub query_granularity: Option<GranularityValue>,
    pub rollup: Option<bool>,
}

/// The ordered dimension (non-metric) column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionsSpec {
    pub dimensions: Vec<String>,
}

/// A single metric aggregator declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub aggregator_type: String,
    pub field_name: Option<String>,
}

/// The policy a segment was actually compacted under, the last time it was
/// compacted. `granularity_spec`, `dimensions_spec`, `transform_spec` and
/// `metrics_spec` arrive as opaque [`serde_json::Value`] documents and are
/// decoded on demand by a [`CompactionStateDecoder`
/// ](crate::CompactionStateDecoder) — see that trait for why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastCompactionState {
    pub partitions_spec: PartitionsSpec,
    pub index_spec: IndexSpec,
    pub granularity_spec: Option<serde_json::Value>,
    pub dimensions_spec: Option<serde_json::Value>,
    pub transform_spec: Option<serde_json::Value>,
    pub metrics_spec: Option<serde_json::Value>,
}
