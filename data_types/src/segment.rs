use std::fmt::{self, Display};

use crate::compaction_state::LastCompactionState;
use crate::interval::Interval;
use crate::shard_spec::ShardSpec;

/// An immutable data file covering a half-open time interval within a
/// datasource.
///
/// Two segments with the same `(datasource, interval, version,
/// shard_spec.partition_num())` are identical, per [`Segment::id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    datasource: String,
    interval: Interval,
    version: String,
    shard_spec: ShardSpec,
    size_bytes: u64,
    last_compaction_state: Option<LastCompactionState>,
}

impl Segment {
    pub fn new(
        datasource: impl Into<String>,
        interval: Interval,
        version: impl Into<String>,
        shard_spec: ShardSpec,
        size_bytes: u64,
        last_compaction_state: Option<LastCompactionState>,
    ) -> Self {
        Self {
            datasource: datasource.into(),
            interval,
            version: version.into(),
            shard_spec,
            size_bytes,
            last_compaction_state,
        }
    }

    pub fn datasource(&self) -> &str {
        &self.datasource
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn shard_spec(&self) -> ShardSpec {
        self.shard_spec
    }

    /// A copy of this segment under a different `ShardSpec`, everything
    /// else unchanged. Used to re-partition a segment synthetically
    /// (e.g. for a regranulated bucket) without disturbing its interval,
    /// version or compaction state.
    pub fn with_shard_spec(mut self, shard_spec: ShardSpec) -> Self {
        self.shard_spec = shard_spec;
        self
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn last_compaction_state(&self) -> Option<&LastCompactionState> {
        self.last_compaction_state.as_ref()
    }

    /// A human-readable identity used in error messages and logs: the
    /// `(datasource, interval, version, partition)` tuple that the data
    /// model treats as this segment's identity.
    pub fn id(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.datasource,
            self.interval,
            self.version,
            self.shard_spec.partition_num()
        )
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// One partition chunk of a [`TimelineHolder`](crate::TimelineHolder): a
/// segment, seen through its position within its version's partition set.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionChunk {
    segment: Segment,
}

impl PartitionChunk {
    pub fn new(segment: Segment) -> Self {
        Self { segment }
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn partition_num(&self) -> u32 {
        self.segment.shard_spec().partition_num()
    }

    pub fn num_partitions(&self) -> u32 {
        self.segment.shard_spec().num_partitions()
    }

    pub fn into_segment(self) -> Segment {
        self.segment
    }
}
