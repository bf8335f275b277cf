use thiserror::Error;

/// Errors that can occur while constructing the value types in this crate.
///
/// These are distinct from [`crate::PlannerError`][planner-error] in the
/// `compaction_planner` crate: everything here is a constructor-time
/// invariant violation on a single value (an interval with `start >= end`,
/// a shard spec with an out-of-range partition number), not a planning
/// decision.
///
/// [planner-error]: ../compaction_planner/enum.PlannerError.html
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DataTypeError {
    #[error("invalid interval: start {start} is not before end {end}")]
    InvalidInterval { start: String, end: String },

    #[error("invalid shard spec: partition {partition_num} is out of range for {num_partitions} partitions")]
    InvalidShardSpec {
        partition_num: u32,
        num_partitions: u32,
    },
}
