use data_types::{Interval, Segment, Timeline};

/// Consumes a datasource's compactible holders newest-first.
///
/// Precomputed at construction from `(timeline, search_intervals)`: for
/// each search interval, every holder `timeline.lookup` returns is kept
/// only if it has at least one chunk, its first chunk's own interval sits
/// inside the search interval (deliberately not generalized to "any
/// chunk"), and its total chunk size is strictly positive.
#[derive(Debug)]
pub struct HolderCursor<'a> {
    compactible: Vec<Vec<Segment>>,
    original: Option<&'a dyn Timeline>,
}

impl<'a> HolderCursor<'a> {
    pub fn new(timeline: &dyn Timeline, search_intervals: &[Interval], original: Option<&'a dyn Timeline>) -> Self {
        let mut compactible = Vec::new();
        for interval in search_intervals {
            for holder in timeline.lookup(*interval) {
                let chunks = holder.chunks();
                if chunks.is_empty() {
                    continue;
                }
                let first_chunk_interval = chunks[0].segment().interval();
                if !interval.contains(&first_chunk_interval) {
                    continue;
                }
                if holder.total_size_bytes() == 0 {
                    continue;
                }
                compactible.push(holder.segments());
            }
        }
        Self { compactible, original }
    }

    pub fn has_next(&self) -> bool {
        !self.compactible.is_empty()
    }

    /// Pop the newest remaining holder's segments. If this cursor was built
    /// over a virtual (regranulated) timeline, re-resolve the candidates'
    /// umbrella span against the original physical timeline so the caller
    /// sees real segments, not synthetic partition chunks.
    pub fn next(&mut self) -> Option<Vec<Segment>> {
        let candidates = self.compactible.pop()?;
        match self.original {
            Some(original) => {
                let umbrella = Interval::umbrella(candidates.iter().map(Segment::interval))?;
                Some(original.find_non_overshadowed(umbrella, true))
            }
            None => Some(candidates),
        }
    }
}
