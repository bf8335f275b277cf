//! Property-flavored checks for the universally-quantified guarantees the
//! planner makes, run against hand-built but varied fixtures rather than
//! generated ones (the crate's property-based tests for the underlying
//! interval algebra already live in `data_types`).

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use compaction_planner::CompactionSegmentIterator;
use data_types::{CompactionConfig, InMemoryTimeline, Interval, Segment, ShardSpec, Timeline};

fn dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn iv(s: &str, e: &str) -> Interval {
    Interval::new(dt(s), dt(e)).unwrap()
}

fn seg(datasource: &str, interval: Interval, size: u64) -> Segment {
    Segment::new(datasource, interval, "v1", ShardSpec::single(), size, None)
}

fn config(input_segment_size_bytes: u64, skip_offset_from_latest: Duration) -> CompactionConfig {
    CompactionConfig {
        input_segment_size_bytes,
        skip_offset_from_latest,
        granularity_spec: None,
        dimensions_spec: None,
        transform_spec: None,
        metrics_spec: None,
        index_spec: None,
        partitions_spec: None,
        max_rows_per_segment: Some(5_000_000),
        max_total_rows: None,
    }
}

/// Size budget: every emitted batch's total size stays within the
/// configured limit.
#[test]
fn emitted_batches_respect_size_budget() {
    let day = |d: i64| {
        let start = dt("2024-01-01T00:00:00Z") + Duration::days(d);
        Interval::new(start, start + Duration::days(1)).unwrap()
    };
    let segments: Vec<Segment> = (0..20).map(|d| seg("a", day(d), 50_000_000)).collect();
    let timeline = InMemoryTimeline::new(segments);

    let mut configs = HashMap::new();
    configs.insert("a".to_string(), config(100_000_000, Duration::zero()));
    let timelines: HashMap<String, &dyn Timeline> = HashMap::from([("a".to_string(), &timeline as &dyn Timeline)]);

    let mut planner = CompactionSegmentIterator::new(configs, timelines, HashMap::new()).unwrap();
    while planner.has_next() {
        let batch = planner.next().unwrap().unwrap();
        let total: u64 = batch.iter().map(Segment::size_bytes).sum();
        assert!(total <= 100_000_000, "batch exceeded size budget: {total}");
    }
}

/// Skip respected: no emitted segment's interval intersects an effective
/// skip interval.
#[test]
fn emitted_segments_never_touch_skip_interval() {
    let day = |d: i64| {
        let start = dt("2024-01-01T00:00:00Z") + Duration::days(d);
        Interval::new(start, start + Duration::days(1)).unwrap()
    };
    let segments: Vec<Segment> = (0..10).map(|d| seg("a", day(d), 100)).collect();
    let timeline = InMemoryTimeline::new(segments);

    let skip = iv("2024-01-04T00:00:00Z", "2024-01-06T00:00:00Z");
    let mut configs = HashMap::new();
    configs.insert("a".to_string(), config(1_000_000_000, Duration::zero()));
    let timelines: HashMap<String, &dyn Timeline> = HashMap::from([("a".to_string(), &timeline as &dyn Timeline)]);
    let mut skip_intervals = HashMap::new();
    skip_intervals.insert("a".to_string(), vec![skip]);

    let mut planner = CompactionSegmentIterator::new(configs, timelines, skip_intervals).unwrap();
    while planner.has_next() {
        let batch = planner.next().unwrap().unwrap();
        for segment in &batch {
            assert!(!segment.interval().overlaps(&skip), "segment {:?} overlaps skip {:?}", segment.interval(), skip);
        }
    }
}

/// Statistics conservation: every non-overshadowed segment within the
/// datasource's total interval is accounted for exactly once, across
/// compacted statistics, skipped statistics, and emitted batches.
#[test]
fn statistics_and_emission_partition_the_segment_set() {
    let day = |d: i64| {
        let start = dt("2024-01-01T00:00:00Z") + Duration::days(d);
        Interval::new(start, start + Duration::days(1)).unwrap()
    };
    // mix of sizes: some individually oversized, most compactible.
    let mut segments: Vec<Segment> = (0..8).map(|d| seg("a", day(d), 10_000_000)).collect();
    segments.push(seg("a", day(8), 2_000_000_000)); // oversized on its own

    let total_segment_count = segments.len() as u64;
    let timeline = InMemoryTimeline::new(segments);

    let mut configs = HashMap::new();
    configs.insert("a".to_string(), config(1_000_000_000, Duration::zero()));
    let timelines: HashMap<String, &dyn Timeline> = HashMap::from([("a".to_string(), &timeline as &dyn Timeline)]);

    let mut planner = CompactionSegmentIterator::new(configs, timelines, HashMap::new()).unwrap();
    let mut emitted_segment_count = 0u64;
    while planner.has_next() {
        emitted_segment_count += planner.next().unwrap().unwrap().len() as u64;
    }

    let skipped = planner.skipped_statistics().get("a").cloned().unwrap_or_default();
    let compacted = planner.compacted_statistics().get("a").cloned().unwrap_or_default();

    assert_eq!(emitted_segment_count + skipped.segment_count + compacted.segment_count, total_segment_count);
}
