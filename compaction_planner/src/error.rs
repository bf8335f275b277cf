use thiserror::Error;

/// Errors the planner surfaces to its caller.
///
/// `EmptyTimeline` and `EndOfIteration` are deliberately absent as
/// variants here: an empty timeline is a silent construction-time skip (see
/// [`CompactionSegmentIterator::new`][new]), and end-of-iteration is
/// `next()` returning `None`, which is what a Rust iterator-shaped type
/// does instead of raising an error for the ordinary terminal case.
///
/// [new]: crate::planner::CompactionSegmentIterator::new
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PlannerError {
    /// A datasource named in the config map had no corresponding timeline.
    #[error("unknown datasource in compaction config: {datasource}")]
    UnknownDatasource { datasource: String },

    /// A segment's stored compaction-state sub-document could not be
    /// decoded into the shape the needs-compaction predicate expected.
    #[error("corrupt compaction state for segment {segment_id} in datasource {datasource}: {detail}")]
    CorruptCompactionState {
        datasource: String,
        segment_id: String,
        detail: String,
    },

    /// The timeline contract was violated: a holder cursor yielded an
    /// empty batch, or `first()`/`last()` returned `None` for a timeline
    /// that `lookup()` still reports holders for. This indicates a bug in
    /// the `Timeline` implementation the planner was given, not in caller
    /// input; iteration for the whole planner is aborted.
    #[error("compaction planner invariant violated: {detail}")]
    InvariantViolation { detail: String },
}
