//! Drives compaction decisions across a set of datasource timelines: which
//! groups of segments are stale relative to a configured target state, in
//! what order to emit them, and which ones the operator's skip windows or
//! size budget rule out this pass.
//!
//! The planner is a plain library type, not a service: [`CompactionSegmentIterator`]
//! is constructed once from every datasource's [`data_types::CompactionConfig`],
//! [`data_types::Timeline`] and operator skip intervals, then driven with
//! `has_next`/`next` until exhausted. It performs no I/O and holds
//! everything it needs in memory for the duration of one run.

mod batch;
mod cursor;
mod error;
mod needs_compaction;
mod planner;
mod search_window;
mod stats;
mod virtual_timeline;

pub use batch::SegmentBatch;
pub use error::PlannerError;
pub use planner::CompactionSegmentIterator;
pub use stats::Statistics;
