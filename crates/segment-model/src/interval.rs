//! Half-open time intervals.

use serde::{Deserialize, Serialize};

use crate::timeline::EditError;

/// A half-open interval `[start, end)` of source time, in seconds.
///
/// Serialized as a two-element array `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", try_from = "[f64; 2]")]
pub struct Interval {
    start: f64,
    end: f64,
}

impl Interval {
    /// Create an interval, requiring finite bounds with `start < end`.
    pub fn new(start: f64, end: f64) -> Result<Self, EditError> {
        if !start.is_finite() || !end.is_finite() || start >= end {
            return Err(EditError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `t` lies in `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    /// Whether `t` lies strictly inside `(start, end)`.
    pub fn contains_interior(&self, t: f64) -> bool {
        t > self.start && t < self.end
    }

    /// Split at an interior point into `[start, t)` and `[t, end)`.
    pub(crate) fn split_at(&self, t: f64) -> (Interval, Interval) {
        debug_assert!(self.contains_interior(t));
        (
            Interval {
                start: self.start,
                end: t,
            },
            Interval {
                start: t,
                end: self.end,
            },
        )
    }

    /// Join with the interval that starts where this one ends.
    pub(crate) fn join(&self, next: &Interval) -> Interval {
        debug_assert_eq!(self.end, next.start);
        Interval {
            start: self.start,
            end: next.end,
        }
    }
}

impl From<Interval> for [f64; 2] {
    fn from(interval: Interval) -> Self {
        [interval.start, interval.end]
    }
}

impl From<Interval> for (f64, f64) {
    fn from(interval: Interval) -> Self {
        (interval.start, interval.end)
    }
}

impl TryFrom<[f64; 2]> for Interval {
    type Error = EditError;

    fn try_from([start, end]: [f64; 2]) -> Result<Self, Self::Error> {
        Interval::new(start, end)
    }
}

impl TryFrom<(f64, f64)> for Interval {
    type Error = EditError;

    fn try_from((start, end): (f64, f64)) -> Result<Self, Self::Error> {
        Interval::new(start, end)
    }
}
