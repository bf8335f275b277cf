use crate::batch::SegmentBatch;

/// Running counters for one datasource, tracked separately for segments the
/// planner has folded into an emitted batch (`compacted`, despite the name
/// — see module docs on `compacted_statistics`/`skipped_statistics`) versus
/// segments the planner declined to act on this pass (`skipped`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub bytes: u64,
    pub segment_count: u64,
    pub interval_count: u64,
}

impl Statistics {
    pub fn record_batch(&mut self, batch: &SegmentBatch) {
        self.bytes += batch.total_size_bytes();
        self.segment_count += batch.segments().len() as u64;
        self.interval_count += batch.distinct_interval_count() as u64;
    }
}
