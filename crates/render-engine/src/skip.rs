//! Removed-range lookup for the export walk.

use vidsplice_common::clock::SimulatedClock;
use vidsplice_common::error::{VidspliceError, VidspliceResult};

/// Removed ranges in milliseconds, sorted and disjoint.
///
/// Membership is inclusive at both ends: a sample exactly on the end of a
/// removed range is still skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovedRanges {
    ranges: Vec<(f64, f64)>,
}

impl RemovedRanges {
    /// Normalize `[start, end]` second pairs: convert to milliseconds, sort
    /// by start, and merge ranges that overlap or touch.
    pub fn from_pairs(pairs: &[[f64; 2]]) -> VidspliceResult<Self> {
        let mut ranges = Vec::with_capacity(pairs.len());
        for &[start, end] in pairs {
            if !start.is_finite() || !end.is_finite() || start > end || start < 0.0 {
                return Err(VidspliceError::invalid_argument(format!(
                    "removed part [{start}, {end}] is not a valid range"
                )));
            }
            ranges.push((
                SimulatedClock::secs_to_ms(start),
                SimulatedClock::secs_to_ms(end),
            ));
        }
        ranges.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut merged: Vec<(f64, f64)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        Ok(Self { ranges: merged })
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn ranges(&self) -> &[(f64, f64)] {
        &self.ranges
    }

    /// Whether `time_ms` falls inside a removed range.
    pub fn contains(&self, time_ms: f64) -> bool {
        let candidate = self.ranges.partition_point(|&(start, _)| start <= time_ms);
        candidate > 0 && time_ms <= self.ranges[candidate - 1].1
    }
}
