use std::collections::BTreeMap;

use data_types::{GranularityValue, InMemoryTimeline, Interval, PartitionChunk, Segment, ShardSpec, Timeline, TimelineHolder};

/// A timeline re-bucketed to an operator-configured segment granularity,
/// built on top of a physical timeline whose own segments may use a finer
/// or simply different bucketing.
///
/// Every chunk wrapped by a holder in [`VirtualTimeline::timeline`] keeps
/// its *original* segment interval; only the holder's own interval is the
/// synthetic bucket. A segment that crosses a bucket boundary under the
/// target granularity is inserted into every bucket it touches, so the
/// same physical segment can appear in more than one virtual holder. Each
/// bucket's segments are also reassigned a fresh `ShardSpec` numbered
/// `0..P-1` (`P` the bucket's own segment count): the segments landing in
/// one bucket came from unrelated physical time-chunks and generally
/// disagree on partition counts, so without a synthetic scheme
/// `TimelineHolder::is_complete` would evaluate stale, unrelated shard
/// specs instead of the bucket's own partition set. The synthetic version
/// string is shared by every holder built in one [`VirtualTimeline::build`]
/// call and, like the synthetic shard specs, must never reach a caller:
/// batches pulled from this timeline are always re-resolved against
/// [`VirtualTimeline::original`] before being handed back.
#[derive(Debug)]
pub struct VirtualTimeline<'a> {
    timeline: InMemoryTimeline,
    original: &'a dyn Timeline,
}

impl<'a> VirtualTimeline<'a> {
    /// Build a regranulated shadow of `original` at the given target
    /// granularity, stamping every synthetic holder with `version`.
    ///
    /// `version` is supplied by the caller rather than generated here so
    /// that a planner run stamps every bucket in a single construction
    /// with one shared value.
    pub fn build(original: &'a dyn Timeline, target: GranularityValue, version: impl Into<String>) -> Self {
        let version = version.into();
        let segments = original.find_non_overshadowed(Interval::eternity(), true);

        let granularity = target.as_granularity();
        let mut by_bucket: BTreeMap<Interval, Vec<Segment>> = BTreeMap::new();
        for segment in segments {
            for bucket in granularity.iterable(segment.interval()) {
                by_bucket.entry(bucket).or_default().push(segment.clone());
            }
        }

        let holders = by_bucket
            .into_iter()
            .map(|(bucket, bucket_segments)| {
                let num_partitions = bucket_segments.len() as u32;
                let chunks: Vec<PartitionChunk> = bucket_segments
                    .into_iter()
                    .enumerate()
                    .map(|(i, segment)| {
                        let synthetic = ShardSpec::new(i as u32, num_partitions).expect("i < bucket_segments.len()");
                        PartitionChunk::new(segment.with_shard_spec(synthetic))
                    })
                    .collect();
                TimelineHolder::new(bucket, version.clone(), chunks)
            })
            .collect();

        Self {
            timeline: InMemoryTimeline::from_holders(holders),
            original,
        }
    }

    pub fn timeline(&self) -> &InMemoryTimeline {
        &self.timeline
    }

    pub fn original(&self) -> &'a dyn Timeline {
        self.original
    }
}
