use itertools::Itertools;

use data_types::{Interval, Segment};

/// An ordered group of segments from a single datasource that the planner
/// has decided belong together, plus the totals the planner re-derives
/// from them on every query rather than re-summing each time.
///
/// [`SegmentBatch::umbrella_interval`] is always computed from each
/// segment's *stored* `Interval`, never from any id-like string. There is
/// no id-derived interval anywhere in this crate to disagree with it.
#[derive(Debug, Clone)]
pub struct SegmentBatch {
    segments: Vec<Segment>,
    total_size_bytes: u64,
    umbrella_interval: Option<Interval>,
    distinct_interval_count: usize,
}

impl SegmentBatch {
    pub fn new(segments: Vec<Segment>) -> Self {
        let total_size_bytes = segments.iter().map(Segment::size_bytes).sum();
        let umbrella_interval = Interval::umbrella(segments.iter().map(Segment::interval));
        let distinct_interval_count = segments.iter().map(Segment::interval).sorted().dedup().count();
        Self {
            segments,
            total_size_bytes,
            umbrella_interval,
            distinct_interval_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.total_size_bytes
    }

    /// `None` only for an empty batch.
    pub fn umbrella_interval(&self) -> Option<Interval> {
        self.umbrella_interval
    }

    pub fn distinct_interval_count(&self) -> usize {
        self.distinct_interval_count
    }

    /// The datasource every segment in a non-empty batch shares.
    pub fn datasource(&self) -> Option<&str> {
        self.segments.first().map(Segment::datasource)
    }
}
