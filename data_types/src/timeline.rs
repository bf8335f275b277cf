use std::collections::BTreeMap;
use std::fmt::Debug;

use observability_deps::tracing::trace;

use crate::interval::Interval;
use crate::segment::{PartitionChunk, Segment};

/// A contiguous time-chunk at a single version of a datasource's timeline,
/// holding one or more partition chunks.
#[derive(Debug, Clone)]
pub struct TimelineHolder {
    interval: Interval,
    version: String,
    chunks: Vec<PartitionChunk>,
}

impl TimelineHolder {
    pub fn new(interval: Interval, version: impl Into<String>, chunks: Vec<PartitionChunk>) -> Self {
        Self {
            interval,
            version: version.into(),
            chunks,
        }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn chunks(&self) -> &[PartitionChunk] {
        &self.chunks
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.chunks.iter().map(|c| c.segment().size_bytes()).sum()
    }

    /// True iff this holder's partition set covers `[0, P)` for the
    /// single `P` every chunk agrees on. A holder whose chunks disagree on
    /// `P`, or that is empty, is never complete.
    pub fn is_complete(&self) -> bool {
        chunks_are_complete(&self.chunks)
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.chunks.iter().map(|c| c.segment().clone()).collect()
    }
}

fn chunks_are_complete(chunks: &[PartitionChunk]) -> bool {
    let Some(first) = chunks.first() else {
        return false;
    };
    let num_partitions = first.num_partitions();
    if num_partitions == 0 {
        return false;
    }
    if chunks.iter().any(|c| c.num_partitions() != num_partitions) {
        return false;
    }
    let mut seen = vec![false; num_partitions as usize];
    for chunk in chunks {
        let idx = chunk.partition_num() as usize;
        if idx >= seen.len() {
            return false;
        }
        seen[idx] = true;
    }
    seen.into_iter().all(|present| present)
}

/// A versioned interval map for one datasource: `lookup` returns the
/// visible (non-overshadowed) holders touching an interval,
/// `find_non_overshadowed` flattens those down to segments, optionally
/// keeping only the ones whose holder is complete.
///
/// The planner depends only on this trait, never on a concrete timeline
/// structure; [`InMemoryTimeline`] is the one concrete implementation this
/// workspace ships, built directly from a flat segment list.
pub trait Timeline: Debug + Send + Sync {
    fn first(&self) -> Option<TimelineHolder>;
    fn last(&self) -> Option<TimelineHolder>;
    fn lookup(&self, interval: Interval) -> Vec<TimelineHolder>;
    fn find_non_overshadowed(&self, interval: Interval, only_complete: bool) -> Vec<Segment>;
}

/// A [`Timeline`] built once, in memory, from a flat list of segments.
///
/// Overshadow resolution groups segments by their exact interval (the
/// common case: a recompaction reuses the same time-chunk boundary as the
/// data it replaces) and, within each interval group, hides every version
/// older than the highest *complete* version present. A version with no
/// strictly newer complete version above it remains visible even if it is
/// itself incomplete, so multiple versions can be simultaneously visible
/// for one interval while ingestion is in flight.
#[derive(Debug, Clone)]
pub struct InMemoryTimeline {
    // interval -> version -> chunks, version-sorted ascending by BTreeMap order
    by_interval: BTreeMap<Interval, BTreeMap<String, Vec<PartitionChunk>>>,
}

impl InMemoryTimeline {
    /// Build a timeline from a flat segment list, one holder per
    /// `(segment.interval(), segment.version())` group. The common case:
    /// every chunk's own interval equals the holder interval that contains
    /// it.
    pub fn new(segments: Vec<Segment>) -> Self {
        let holders = {
            let mut by_key: BTreeMap<(Interval, String), Vec<PartitionChunk>> = BTreeMap::new();
            for segment in segments {
                let key = (segment.interval(), segment.version().to_string());
                by_key.entry(key).or_default().push(PartitionChunk::new(segment));
            }
            by_key
                .into_iter()
                .map(|((interval, version), chunks)| TimelineHolder::new(interval, version, chunks))
                .collect()
        };
        Self::from_holders(holders)
    }

    /// Build a timeline directly from pre-built holders, grouping by
    /// `holder.interval()`. Unlike [`InMemoryTimeline::new`], a holder's
    /// interval here need not equal the interval of the segments its chunks
    /// wrap: a virtual, regranulated timeline uses this to key holders by a
    /// synthetic bucket (say, a month) while every chunk inside retains its
    /// original, physical segment interval (say, a week spanning the
    /// bucket boundary), so that re-resolving the holder's true physical
    /// span against the underlying timeline later still works.
    pub fn from_holders(holders: Vec<TimelineHolder>) -> Self {
        let mut by_interval: BTreeMap<Interval, BTreeMap<String, Vec<PartitionChunk>>> = BTreeMap::new();
        for holder in holders {
            by_interval
                .entry(holder.interval())
                .or_default()
                .entry(holder.version().to_string())
                .or_default()
                .extend(holder.chunks().iter().cloned());
        }
        Self { by_interval }
    }

    pub fn is_empty(&self) -> bool {
        self.by_interval.is_empty()
    }

    fn visible_holders_for(&self, interval: &Interval, versions: &BTreeMap<String, Vec<PartitionChunk>>) -> Vec<TimelineHolder> {
        let max_complete_version = versions
            .iter()
            .filter(|(_, chunks)| chunks_are_complete(chunks))
            .map(|(v, _)| v.clone())
            .max();

        if let Some(max_v) = &max_complete_version {
            for version in versions.keys().filter(|v| *v < max_v) {
                trace!(%interval, shadowed_version = %version, shadowing_version = %max_v, "hiding overshadowed version");
            }
        }

        versions
            .iter()
            .filter(|(version, _)| match &max_complete_version {
                Some(max_v) => *version >= max_v,
                None => true,
            })
            .map(|(version, chunks)| TimelineHolder::new(*interval, version.clone(), chunks.clone()))
            .collect()
    }

    fn all_visible_holders(&self) -> Vec<TimelineHolder> {
        let mut holders: Vec<TimelineHolder> = self
            .by_interval
            .iter()
            .flat_map(|(interval, versions)| self.visible_holders_for(interval, versions))
            .collect();
        holders.sort_by_key(|h| (h.interval().start(), h.interval().end(), h.version().to_string()));
        holders
    }
}

impl Timeline for InMemoryTimeline {
    fn first(&self) -> Option<TimelineHolder> {
        self.by_interval
            .iter()
            .next()
            .map(|(interval, versions)| {
                self.visible_holders_for(interval, versions)
                    .into_iter()
                    .min_by_key(|h| h.version().to_string())
            })
            .flatten()
    }

    fn last(&self) -> Option<TimelineHolder> {
        self.by_interval
            .iter()
            .next_back()
            .map(|(interval, versions)| {
                self.visible_holders_for(interval, versions)
                    .into_iter()
                    .max_by_key(|h| h.version().to_string())
            })
            .flatten()
    }

    fn lookup(&self, interval: Interval) -> Vec<TimelineHolder> {
        self.all_visible_holders()
            .into_iter()
            .filter(|h| h.interval().overlaps(&interval))
            .collect()
    }

    fn find_non_overshadowed(&self, interval: Interval, only_complete: bool) -> Vec<Segment> {
        self.lookup(interval)
            .into_iter()
            .filter(|h| !only_complete || h.is_complete())
            .flat_map(|h| h.segments())
            .collect()
    }
}
