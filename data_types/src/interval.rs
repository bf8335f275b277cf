use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataTypeError;

/// A half-open time interval `[start, end)`.
///
/// Construction enforces `start < end`; there is no such thing as an empty
/// or reversed [`Interval`] in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DataTypeError> {
        if start >= end {
            return Err(DataTypeError::InvalidInterval {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// The interval spanning all representable instants.
    pub fn eternity() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// `self` wholly contains `other`.
    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// `self` and `other` share at least one instant.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The smallest interval containing every interval in `intervals`.
    ///
    /// Returns `None` for an empty input.
    pub fn umbrella<I>(intervals: I) -> Option<Interval>
    where
        I: IntoIterator<Item = Interval>,
    {
        let mut iter = intervals.into_iter();
        let first = iter.next()?;
        let (start, end) = iter.fold((first.start, first.end), |(s, e), i| {
            (s.min(i.start), e.max(i.end))
        });
        // `start`/`end` were each derived from at least one valid interval's
        // own already-valid endpoints, so `start < end` still holds.
        Some(Interval { start, end })
    }

    /// The maximal disjoint subintervals of `total` that do not overlap any
    /// interval in `skips`.
    ///
    /// `skips` must be sorted by `(start, end)`; skips that are not fully
    /// contained in the current remaining range are trimmed from whichever
    /// side overlaps, and a skip that overlaps neither side of the
    /// remaining range at all is ignored (degenerate input, per the
    /// walk below).
    pub fn subtract_skips(total: Interval, skips: &[Interval]) -> Vec<Interval> {
        let mut out = Vec::new();
        let mut remaining_start = total.start;
        let mut remaining_end = total.end;

        for skip in skips {
            if remaining_start >= remaining_end {
                break;
            }
            let remaining = Interval {
                start: remaining_start,
                end: remaining_end,
            };
            if !remaining.overlaps(skip) {
                continue;
            }
            let trims_left = skip.start <= remaining_start;
            let trims_right = skip.end >= remaining_end;
            match (trims_left, trims_right) {
                (true, true) => {
                    // skip covers the whole remaining range
                    remaining_start = remaining_end;
                }
                (true, false) => {
                    // only trims the left
                    remaining_start = skip.end;
                }
                (false, true) => {
                    // only trims the right
                    remaining_end = skip.start;
                }
                (false, false) => {
                    // skip strictly inside the remaining range
                    out.push(Interval {
                        start: remaining_start,
                        end: skip.start,
                    });
                    remaining_start = skip.end;
                }
            }
        }

        if remaining_start < remaining_end {
            out.push(Interval {
                start: remaining_start,
                end: remaining_end,
            });
        }
        out
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
