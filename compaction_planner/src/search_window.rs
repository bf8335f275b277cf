use chrono::Duration;
use itertools::Itertools;

use data_types::{Granularity, Interval, Segment, Timeline};

use crate::stats::Statistics;

/// Build the ordered candidate search intervals for one datasource's
/// timeline: carve the tail the operator wants left alone (skip-offset,
/// optionally aligned to the regranulation target, and merged with any
/// operator-declared skip intervals it overlaps) out of the timeline's full
/// span, then tighten what's left down to where segments actually sit.
///
/// Segments that fall entirely inside an effective skip are folded into
/// `skipped` as a side effect; callers use this to seed
/// [`crate::planner::CompactionSegmentIterator::skipped_statistics`] before
/// the cursor ever runs.
pub fn build_search_intervals(
    timeline: &dyn Timeline,
    skip_offset_from_latest: Duration,
    regranulate_to: Option<&dyn Granularity>,
    operator_skips: &[Interval],
    skipped: &mut Statistics,
) -> Vec<Interval> {
    let (Some(first), Some(last)) = (timeline.first(), timeline.last()) else {
        return Vec::new();
    };
    let latest = last.interval().end();
    let earliest = first.interval().start();

    let tail = match regranulate_to {
        Some(granularity) => {
            let aligned_start = granularity.bucket_start(latest - skip_offset_from_latest);
            // bucket_start may land exactly on `latest` for a zero offset
            // aligned to a bucket boundary; guard against a degenerate
            // empty tail by falling back to the raw offset in that case.
            if aligned_start < latest {
                Interval::new(aligned_start, latest).ok()
            } else {
                Interval::new(latest - skip_offset_from_latest, latest).ok()
            }
        }
        None => Interval::new(latest - skip_offset_from_latest, latest).ok(),
    };

    let mut sorted_operator_skips = operator_skips.to_vec();
    sorted_operator_skips.sort();

    let mut effective_skips: Vec<Interval> = Vec::new();
    if let Some(tail) = tail {
        let (overlapping, disjoint): (Vec<Interval>, Vec<Interval>) =
            sorted_operator_skips.into_iter().partition(|s| s.overlaps(&tail));
        let merged_tail = Interval::umbrella(std::iter::once(tail).chain(overlapping)).unwrap_or(tail);
        effective_skips.push(merged_tail);
        effective_skips.extend(disjoint);
    } else {
        effective_skips.extend(sorted_operator_skips);
    }
    effective_skips.sort();

    let total_interval = match Interval::new(earliest, latest) {
        Ok(i) => i,
        Err(_) => return Vec::new(),
    };

    record_skipped_segments(timeline, &total_interval, &effective_skips, skipped);

    let candidate_lookups = Interval::subtract_skips(total_interval, &effective_skips);

    let mut tightened: Vec<Interval> = candidate_lookups
        .into_iter()
        .filter_map(|lookup| tighten_to_segment_span(timeline, lookup))
        .collect();
    tightened.sort();
    tightened
}

fn record_skipped_segments(timeline: &dyn Timeline, total: &Interval, effective_skips: &[Interval], skipped: &mut Statistics) {
    let all_segments = timeline.find_non_overshadowed(*total, true);
    for skip in effective_skips {
        let fully_inside: Vec<Segment> = all_segments
            .iter()
            .filter(|s| skip.contains(&s.interval()))
            .cloned()
            .collect();
        skipped.bytes += fully_inside.iter().map(Segment::size_bytes).sum::<u64>();
        skipped.segment_count += fully_inside.len() as u64;
        skipped.interval_count += fully_inside.iter().map(Segment::interval).sorted().dedup().count() as u64;
    }
}

fn tighten_to_segment_span(timeline: &dyn Timeline, lookup: Interval) -> Option<Interval> {
    let segments = timeline.find_non_overshadowed(lookup, true);
    let contained: Vec<Segment> = segments.into_iter().filter(|s| lookup.contains(&s.interval())).collect();
    if contained.is_empty() {
        return None;
    }
    Interval::umbrella(contained.iter().map(Segment::interval))
}
