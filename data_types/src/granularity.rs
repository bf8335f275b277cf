use std::fmt::Debug;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::Interval;

/// A scheme for carving the timeline into aligned, non-overlapping buckets.
///
/// This is the abstraction both the virtual regranulated timeline
/// (`compaction_planner::virtual_timeline`) and the search-window builder
/// (`compaction_planner::search_window`) iterate over; it knows nothing
/// about segments or datasources.
pub trait Granularity: Debug + Send + Sync {
    /// The aligned bucket `[start, end)` containing `t`.
    fn bucket_containing(&self, t: DateTime<Utc>) -> Interval;

    /// Align `t` down to the start of its bucket.
    fn bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        self.bucket_containing(t).start()
    }

    /// Every aligned bucket intersecting `interval`, in increasing order.
    fn iterable(&self, interval: Interval) -> Vec<Interval> {
        let mut buckets = Vec::new();
        let mut cursor = interval.start();
        while cursor < interval.end() {
            let bucket = self.bucket_containing(cursor);
            cursor = bucket.end();
            buckets.push(bucket);
        }
        buckets
    }

    /// True iff `interval` is exactly one aligned bucket of this granularity.
    fn is_aligned(&self, interval: Interval) -> bool {
        self.bucket_containing(interval.start()) == interval
    }
}

/// A granularity whose buckets are a fixed [`Duration`] wide, anchored at
/// the Unix epoch.
#[derive(Debug, Clone, Copy)]
pub struct FixedGranularity {
    width: Duration,
}

impl FixedGranularity {
    pub fn new(width: Duration) -> Self {
        assert!(width > Duration::zero(), "granularity width must be positive");
        Self { width }
    }
}

impl Granularity for FixedGranularity {
    fn bucket_containing(&self, t: DateTime<Utc>) -> Interval {
        let width_secs = self.width.num_seconds();
        let epoch_secs = t.timestamp();
        // Euclidean division so instants before the epoch still align.
        let idx = epoch_secs.div_euclid(width_secs);
        let start = Utc.timestamp_opt(idx * width_secs, 0).unwrap();
        let end = start + self.width;
        Interval::new(start, end).expect("fixed-width bucket is always non-empty")
    }
}

/// A granularity whose buckets follow the civil calendar (month, quarter,
/// year) and are therefore not a fixed [`Duration`] wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarGranularity {
    Month,
    Quarter,
    Year,
}

impl Granularity for CalendarGranularity {
    fn bucket_containing(&self, t: DateTime<Utc>) -> Interval {
        let (start_year, start_month) = match self {
            CalendarGranularity::Month => (t.year(), t.month()),
            CalendarGranularity::Quarter => {
                let quarter_index = (t.month() - 1) / 3;
                (t.year(), quarter_index * 3 + 1)
            }
            CalendarGranularity::Year => (t.year(), 1),
        };
        let months_per_bucket = match self {
            CalendarGranularity::Month => 1,
            CalendarGranularity::Quarter => 3,
            CalendarGranularity::Year => 12,
        };
        let start = Utc.with_ymd_and_hms(start_year, start_month, 1, 0, 0, 0).unwrap();
        let end_total_months = (start_year * 12 + (start_month as i32 - 1)) + months_per_bucket;
        let end_year = end_total_months.div_euclid(12);
        let end_month = (end_total_months.rem_euclid(12) + 1) as u32;
        let end = Utc.with_ymd_and_hms(end_year, end_month, 1, 0, 0, 0).unwrap();
        Interval::new(start, end).expect("calendar bucket is always non-empty")
    }
}

/// The single bucket spanning all representable time.
#[derive(Debug, Clone, Copy)]
pub struct AllGranularity;

impl Granularity for AllGranularity {
    fn bucket_containing(&self, _t: DateTime<Utc>) -> Interval {
        Interval::eternity()
    }
}

/// The catalog of granularities an operator can name in a [`GranularitySpec`
/// ](crate::GranularitySpec) or that can appear, decoded, in a
/// [`LastCompactionState`](crate::LastCompactionState). Structural equality
/// on this enum is what the needs-compaction predicate compares; the
/// [`Granularity`] behavior for a given value is reached through
/// [`GranularityValue::as_granularity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GranularityValue {
    Second,
    Minute,
    FiveMinute,
    TenMinute,
    FifteenMinute,
    ThirtyMinute,
    Hour,
    SixHour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    All,
}

impl GranularityValue {
    pub fn as_granularity(&self) -> Box<dyn Granularity> {
        use GranularityValue::*;
        match self {
            Second => Box::new(FixedGranularity::new(Duration::seconds(1))),
            Minute => Box::new(FixedGranularity::new(Duration::minutes(1))),
            FiveMinute => Box::new(FixedGranularity::new(Duration::minutes(5))),
            TenMinute => Box::new(FixedGranularity::new(Duration::minutes(10))),
            FifteenMinute => Box::new(FixedGranularity::new(Duration::minutes(15))),
            ThirtyMinute => Box::new(FixedGranularity::new(Duration::minutes(30))),
            Hour => Box::new(FixedGranularity::new(Duration::hours(1))),
            SixHour => Box::new(FixedGranularity::new(Duration::hours(6))),
            Day => Box::new(FixedGranularity::new(Duration::days(1))),
            Week => Box::new(FixedGranularity::new(Duration::days(7))),
            Month => Box::new(CalendarGranularity::Month),
            Quarter => Box::new(CalendarGranularity::Quarter),
            Year => Box::new(CalendarGranularity::Year),
            All => Box::new(AllGranularity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn daily_bucket_start_aligns_down() {
        let g = GranularityValue::Day.as_granularity();
        let t = dt("2024-01-05T13:45:00Z");
        assert_eq!(g.bucket_start(t), dt("2024-01-05T00:00:00Z"));
    }

    #[test]
    fn daily_iterable_spans_multiple_days() {
        let g = GranularityValue::Day.as_granularity();
        let interval = Interval::new(dt("2024-01-05T12:00:00Z"), dt("2024-01-07T06:00:00Z")).unwrap();
        let buckets = g.iterable(interval);
        assert_eq!(
            buckets,
            vec![
                Interval::new(dt("2024-01-05T00:00:00Z"), dt("2024-01-06T00:00:00Z")).unwrap(),
                Interval::new(dt("2024-01-06T00:00:00Z"), dt("2024-01-07T00:00:00Z")).unwrap(),
                Interval::new(dt("2024-01-07T00:00:00Z"), dt("2024-01-08T00:00:00Z")).unwrap(),
            ]
        );
    }

    #[test]
    fn is_aligned_requires_exact_bucket_match() {
        let g = GranularityValue::Day.as_granularity();
        let aligned = Interval::new(dt("2024-01-05T00:00:00Z"), dt("2024-01-06T00:00:00Z")).unwrap();
        assert!(g.is_aligned(aligned));

        let misaligned = Interval::new(dt("2024-01-05T06:00:00Z"), dt("2024-01-06T00:00:00Z")).unwrap();
        assert!(!g.is_aligned(misaligned));

        let two_days = Interval::new(dt("2024-01-05T00:00:00Z"), dt("2024-01-07T00:00:00Z")).unwrap();
        assert!(!g.is_aligned(two_days));
    }

    #[test]
    fn month_granularity_handles_variable_widths() {
        let g = GranularityValue::Month.as_granularity();
        assert_eq!(
            g.bucket_containing(dt("2024-02-15T00:00:00Z")),
            Interval::new(dt("2024-02-01T00:00:00Z"), dt("2024-03-01T00:00:00Z")).unwrap()
        );
        // December rolls over into the next year.
        assert_eq!(
            g.bucket_containing(dt("2023-12-15T00:00:00Z")),
            Interval::new(dt("2023-12-01T00:00:00Z"), dt("2024-01-01T00:00:00Z")).unwrap()
        );
    }

    #[test]
    fn weekly_segments_bucket_into_months() {
        // A week spanning a month boundary should appear in both buckets.
        let month = GranularityValue::Month.as_granularity();
        let week = Interval::new(dt("2020-01-28T00:00:00Z"), dt("2020-02-03T00:00:00Z")).unwrap();
        let buckets = month.iterable(week);
        assert_eq!(
            buckets,
            vec![
                Interval::new(dt("2020-01-01T00:00:00Z"), dt("2020-02-01T00:00:00Z")).unwrap(),
                Interval::new(dt("2020-02-01T00:00:00Z"), dt("2020-03-01T00:00:00Z")).unwrap(),
            ]
        );
    }

    #[test]
    fn all_granularity_is_a_single_eternal_bucket() {
        let g = GranularityValue::All.as_granularity();
        let t = dt("2024-01-05T00:00:00Z");
        assert_eq!(g.bucket_containing(t), Interval::eternity());
    }

    #[test]
    fn fixed_granularity_aligns_instants_before_the_epoch() {
        let g = FixedGranularity::new(Duration::hours(1));
        let t = Utc.timestamp_opt(-3601, 0).unwrap();
        let bucket = g.bucket_containing(t);
        assert_eq!(bucket.start(), Utc.timestamp_opt(-7200, 0).unwrap());
        assert_eq!(bucket.end(), Utc.timestamp_opt(-3600, 0).unwrap());
    }
}
