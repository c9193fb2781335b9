//! Partition of a video's timeline into parts, with removal tombstones.
//!
//! The timeline `[0, video_length)` is always covered exactly by `parts`:
//! sorted, contiguous, no gaps and no overlaps. Cuts are the interior
//! boundaries between parts. Removing a part only records a tombstone; the
//! part stays in the partition so it can be restored.

use crate::interval::Interval;

/// Errors raised by segment edits.
///
/// Every variant is an invalid-argument condition. A failed edit leaves the
/// timeline untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("Invalid video length: {length}")]
    InvalidLength { length: f64 },

    #[error("Invalid interval [{start}, {end})")]
    InvalidInterval { start: f64, end: f64 },

    #[error("Cut at {t}s is outside (0, {video_length})")]
    CutOutOfBounds { t: f64, video_length: f64 },

    #[error("No cut at {t}s")]
    NotACut { t: f64 },

    #[error("Part index {index} out of range (have {len} parts)")]
    PartIndexOutOfRange { index: usize, len: usize },

    #[error("Invalid partition: {message}")]
    InvalidPartition { message: String },
}

/// What an edit changed. Both flags false means the edit was a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mutation {
    pub parts_changed: bool,
    pub removed_changed: bool,
}

impl Mutation {
    pub const NONE: Mutation = Mutation {
        parts_changed: false,
        removed_changed: false,
    };

    pub fn is_noop(&self) -> bool {
        !self.parts_changed && !self.removed_changed
    }
}

/// Segment state for one source video.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentTimeline {
    video_length: f64,
    parts: Vec<Interval>,
    /// Tombstones, sorted by start. Each equals some entry of `parts`.
    removed: Vec<Interval>,
    selection: Option<usize>,
}

impl SegmentTimeline {
    /// A timeline with a single part spanning the whole video.
    pub fn new(video_length: f64) -> Result<Self, EditError> {
        let whole = whole_interval(video_length)?;
        Ok(Self {
            video_length,
            parts: vec![whole],
            removed: Vec::new(),
            selection: None,
        })
    }

    /// Rebuild a timeline from persisted parts and tombstones.
    ///
    /// Parts must partition `[0, video_length)`; every tombstone must match
    /// a part. Duplicate tombstones are collapsed.
    pub fn from_parts(
        video_length: f64,
        parts: Vec<Interval>,
        removed: Vec<Interval>,
    ) -> Result<Self, EditError> {
        whole_interval(video_length)?;
        validate_partition(video_length, &parts)?;

        let mut timeline = Self {
            video_length,
            parts,
            removed: Vec::with_capacity(removed.len()),
            selection: None,
        };
        for interval in removed {
            if !timeline.parts.contains(&interval) {
                return Err(EditError::InvalidPartition {
                    message: format!(
                        "removed part [{}, {}) does not match any part",
                        interval.start(),
                        interval.end()
                    ),
                });
            }
            timeline.insert_tombstone(interval);
        }
        Ok(timeline)
    }

    pub fn video_length(&self) -> f64 {
        self.video_length
    }

    /// Current parts in timeline order.
    pub fn parts(&self) -> &[Interval] {
        &self.parts
    }

    /// Current tombstones in timeline order.
    pub fn removed_parts(&self) -> &[Interval] {
        &self.removed
    }

    /// Tombstones as `[start, end]` second pairs, the export input format.
    pub fn removed_pairs(&self) -> Vec<[f64; 2]> {
        self.removed.iter().copied().map(Into::into).collect()
    }

    /// Interior boundaries, ascending.
    pub fn cuts(&self) -> Vec<f64> {
        self.parts.iter().skip(1).map(Interval::start).collect()
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn is_removed(&self, index: usize) -> bool {
        self.parts
            .get(index)
            .is_some_and(|part| self.removed.contains(part))
    }

    /// Index of the part containing `t`, if `t` is inside the timeline.
    pub fn part_at(&self, t: f64) -> Option<usize> {
        if !(0.0..self.video_length).contains(&t) {
            return None;
        }
        Some(self.parts.partition_point(|p| p.end() <= t))
    }

    /// Total duration of parts not marked removed.
    pub fn kept_duration(&self) -> f64 {
        let removed: f64 = self.removed.iter().map(Interval::duration).sum();
        self.video_length - removed
    }

    /// Split the part containing `t` at `t`.
    ///
    /// Cutting on an existing boundary changes nothing. A tombstoned part
    /// that gets split leaves both halves tombstoned, so a cut never changes
    /// what an export would contain.
    pub fn insert_cut(&mut self, t: f64) -> Result<Mutation, EditError> {
        if !t.is_finite() || t <= 0.0 || t >= self.video_length {
            return Err(EditError::CutOutOfBounds {
                t,
                video_length: self.video_length,
            });
        }
        if self.parts.iter().any(|p| p.start() == t) {
            return Ok(Mutation::NONE);
        }

        let index = self.part_at(t).ok_or(EditError::CutOutOfBounds {
            t,
            video_length: self.video_length,
        })?;
        let part = self.parts[index];
        let (left, right) = part.split_at(t);
        self.parts.splice(index..=index, [left, right]);

        let was_removed = self.take_tombstone(&part);
        if was_removed {
            self.insert_tombstone(left);
            self.insert_tombstone(right);
        }
        self.selection = None;

        Ok(Mutation {
            parts_changed: true,
            removed_changed: was_removed,
        })
    }

    /// Merge the two parts sharing the boundary at `t`.
    ///
    /// Tombstones on either merged part are dropped; their bounds no longer
    /// exist in the partition.
    pub fn remove_cut(&mut self, t: f64) -> Result<Mutation, EditError> {
        let index = self
            .parts
            .iter()
            .skip(1)
            .position(|p| p.start() == t)
            .ok_or(EditError::NotACut { t })?;

        let left = self.parts[index];
        let right = self.parts[index + 1];
        self.parts.splice(index..=index + 1, [left.join(&right)]);

        let dropped_left = self.take_tombstone(&left);
        let dropped_right = self.take_tombstone(&right);
        self.selection = None;

        Ok(Mutation {
            parts_changed: true,
            removed_changed: dropped_left || dropped_right,
        })
    }

    /// Tombstone `parts[index]`. Marking an already removed part is a no-op.
    pub fn mark_removed(&mut self, index: usize) -> Result<Mutation, EditError> {
        let part = *self.part(index)?;
        if self.removed.contains(&part) {
            return Ok(Mutation::NONE);
        }
        self.insert_tombstone(part);
        Ok(Mutation {
            parts_changed: false,
            removed_changed: true,
        })
    }

    /// Drop the tombstone of `parts[index]`, if any.
    pub fn restore(&mut self, index: usize) -> Result<Mutation, EditError> {
        let part = *self.part(index)?;
        Ok(Mutation {
            parts_changed: false,
            removed_changed: self.take_tombstone(&part),
        })
    }

    /// Select `index`, or clear the selection if it is already selected.
    pub fn toggle_select(&mut self, index: usize) -> Result<(), EditError> {
        self.part(index)?;
        self.selection = if self.selection == Some(index) {
            None
        } else {
            Some(index)
        };
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Tombstone the selected part. No-op without a selection.
    pub fn remove_selected(&mut self) -> Result<Mutation, EditError> {
        match self.selection {
            Some(index) => self.mark_removed(index),
            None => Ok(Mutation::NONE),
        }
    }

    /// Restore the selected part. No-op without a selection.
    pub fn restore_selected(&mut self) -> Result<Mutation, EditError> {
        match self.selection {
            Some(index) => self.restore(index),
            None => Ok(Mutation::NONE),
        }
    }

    fn part(&self, index: usize) -> Result<&Interval, EditError> {
        self.parts.get(index).ok_or(EditError::PartIndexOutOfRange {
            index,
            len: self.parts.len(),
        })
    }

    fn insert_tombstone(&mut self, interval: Interval) {
        if self.removed.contains(&interval) {
            return;
        }
        let at = self
            .removed
            .partition_point(|r| r.start() < interval.start());
        self.removed.insert(at, interval);
    }

    fn take_tombstone(&mut self, interval: &Interval) -> bool {
        match self.removed.iter().position(|r| r == interval) {
            Some(at) => {
                self.removed.remove(at);
                true
            }
            None => false,
        }
    }
}

fn whole_interval(video_length: f64) -> Result<Interval, EditError> {
    if !video_length.is_finite() || video_length <= 0.0 {
        return Err(EditError::InvalidLength {
            length: video_length,
        });
    }
    Interval::new(0.0, video_length)
}

fn validate_partition(video_length: f64, parts: &[Interval]) -> Result<(), EditError> {
    let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
        return Err(EditError::InvalidPartition {
            message: "no parts".to_string(),
        });
    };
    if first.start() != 0.0 {
        return Err(EditError::InvalidPartition {
            message: format!("first part starts at {} instead of 0", first.start()),
        });
    }
    if last.end() != video_length {
        return Err(EditError::InvalidPartition {
            message: format!(
                "last part ends at {} instead of {video_length}",
                last.end()
            ),
        });
    }
    if let Some(pair) = parts.windows(2).find(|w| w[0].end() != w[1].start()) {
        return Err(EditError::InvalidPartition {
            message: format!(
                "parts [{}, {}) and [{}, {}) are not contiguous",
                pair[0].start(),
                pair[0].end(),
                pair[1].start(),
                pair[1].end()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: f64, end: f64) -> Interval {
        Interval::new(start, end).unwrap()
    }

    fn two_parts() -> SegmentTimeline {
        let mut timeline = SegmentTimeline::new(10.0).unwrap();
        timeline.insert_cut(5.0).unwrap();
        timeline
    }

    #[test]
    fn test_new_timeline_is_single_part() {
        let timeline = SegmentTimeline::new(10.0).unwrap();
        assert_eq!(timeline.parts(), &[iv(0.0, 10.0)]);
        assert!(timeline.removed_parts().is_empty());
        assert!(timeline.cuts().is_empty());
        assert_eq!(timeline.selection(), None);
    }

    #[test]
    fn test_new_rejects_bad_length() {
        assert!(SegmentTimeline::new(0.0).is_err());
        assert!(SegmentTimeline::new(-3.0).is_err());
        assert!(SegmentTimeline::new(f64::NAN).is_err());
    }

    #[test]
    fn test_insert_cut_splits_part() {
        let mut timeline = SegmentTimeline::new(10.0).unwrap();
        let change = timeline.insert_cut(5.0).unwrap();
        assert!(change.parts_changed);
        assert!(!change.removed_changed);
        assert_eq!(timeline.parts(), &[iv(0.0, 5.0), iv(5.0, 10.0)]);
        assert_eq!(timeline.cuts(), vec![5.0]);
    }

    #[test]
    fn test_insert_cut_twice_is_noop() {
        let mut timeline = two_parts();
        let change = timeline.insert_cut(5.0).unwrap();
        assert!(change.is_noop());
        assert_eq!(timeline.parts().len(), 2);
    }

    #[test]
    fn test_insert_cut_keeps_parts_sorted() {
        let mut timeline = SegmentTimeline::new(10.0).unwrap();
        timeline.insert_cut(7.0).unwrap();
        timeline.insert_cut(2.0).unwrap();
        timeline.insert_cut(4.5).unwrap();
        assert_eq!(
            timeline.parts(),
            &[iv(0.0, 2.0), iv(2.0, 4.5), iv(4.5, 7.0), iv(7.0, 10.0)]
        );
    }

    #[test]
    fn test_insert_cut_rejects_out_of_bounds() {
        let mut timeline = SegmentTimeline::new(10.0).unwrap();
        for t in [0.0, 10.0, -1.0, 11.0, f64::NAN] {
            assert!(matches!(
                timeline.insert_cut(t),
                Err(EditError::CutOutOfBounds { .. })
            ));
        }
        assert_eq!(timeline.parts().len(), 1);
    }

    #[test]
    fn test_insert_cut_inside_removed_part_keeps_both_halves_removed() {
        let mut timeline = two_parts();
        timeline.mark_removed(1).unwrap();
        let change = timeline.insert_cut(8.0).unwrap();
        assert!(change.removed_changed);
        assert_eq!(timeline.removed_parts(), &[iv(5.0, 8.0), iv(8.0, 10.0)]);
        assert!((timeline.kept_duration() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_cut_merges_parts() {
        let mut timeline = two_parts();
        let change = timeline.remove_cut(5.0).unwrap();
        assert!(change.parts_changed);
        assert_eq!(timeline.parts(), &[iv(0.0, 10.0)]);
    }

    #[test]
    fn test_remove_cut_drops_stale_tombstone() {
        let mut timeline = two_parts();
        timeline.mark_removed(1).unwrap();
        let change = timeline.remove_cut(5.0).unwrap();
        assert!(change.removed_changed);
        assert!(timeline.removed_parts().is_empty());
    }

    #[test]
    fn test_remove_cut_requires_interior_boundary() {
        let mut timeline = two_parts();
        for t in [0.0, 10.0, 3.0] {
            assert_eq!(timeline.remove_cut(t), Err(EditError::NotACut { t }));
        }
        assert_eq!(timeline.parts().len(), 2);
    }

    #[test]
    fn test_structural_change_clears_selection() {
        let mut timeline = two_parts();
        timeline.toggle_select(1).unwrap();
        timeline.insert_cut(7.0).unwrap();
        assert_eq!(timeline.selection(), None);

        timeline.toggle_select(0).unwrap();
        timeline.remove_cut(7.0).unwrap();
        assert_eq!(timeline.selection(), None);
    }

    #[test]
    fn test_mark_removed_is_idempotent() {
        let mut timeline = two_parts();
        assert!(timeline.mark_removed(1).unwrap().removed_changed);
        assert!(timeline.mark_removed(1).unwrap().is_noop());
        assert_eq!(timeline.removed_parts(), &[iv(5.0, 10.0)]);
        assert!(timeline.is_removed(1));
        assert!(!timeline.is_removed(0));
    }

    #[test]
    fn test_removed_parts_stay_sorted() {
        let mut timeline = SegmentTimeline::new(9.0).unwrap();
        timeline.insert_cut(3.0).unwrap();
        timeline.insert_cut(6.0).unwrap();
        timeline.mark_removed(2).unwrap();
        timeline.mark_removed(0).unwrap();
        assert_eq!(timeline.removed_parts(), &[iv(0.0, 3.0), iv(6.0, 9.0)]);
        assert_eq!(timeline.removed_pairs(), vec![[0.0, 3.0], [6.0, 9.0]]);
    }

    #[test]
    fn test_restore_round_trip() {
        let mut timeline = two_parts();
        let before = timeline.clone();
        timeline.mark_removed(0).unwrap();
        assert!(timeline.restore(0).unwrap().removed_changed);
        assert_eq!(timeline, before);
    }

    #[test]
    fn test_restore_without_tombstone_is_noop() {
        let mut timeline = two_parts();
        assert!(timeline.restore(1).unwrap().is_noop());
    }

    #[test]
    fn test_index_out_of_range() {
        let mut timeline = two_parts();
        let expected = Err(EditError::PartIndexOutOfRange { index: 2, len: 2 });
        assert_eq!(timeline.mark_removed(2), expected);
        assert_eq!(timeline.restore(2), expected);
        assert_eq!(
            timeline.toggle_select(2),
            Err(EditError::PartIndexOutOfRange { index: 2, len: 2 })
        );
        assert!(timeline.removed_parts().is_empty());
        assert_eq!(timeline.selection(), None);
    }

    #[test]
    fn test_toggle_select_is_exclusive() {
        let mut timeline = two_parts();
        timeline.toggle_select(1).unwrap();
        assert_eq!(timeline.selection(), Some(1));
        timeline.toggle_select(1).unwrap();
        assert_eq!(timeline.selection(), None);

        timeline.toggle_select(1).unwrap();
        timeline.toggle_select(0).unwrap();
        assert_eq!(timeline.selection(), Some(0));
    }

    #[test]
    fn test_remove_and_restore_selected() {
        let mut timeline = two_parts();
        assert!(timeline.remove_selected().unwrap().is_noop());

        timeline.toggle_select(1).unwrap();
        timeline.remove_selected().unwrap();
        assert_eq!(timeline.removed_parts(), &[iv(5.0, 10.0)]);

        timeline.restore_selected().unwrap();
        assert!(timeline.removed_parts().is_empty());
    }

    #[test]
    fn test_part_at() {
        let timeline = two_parts();
        assert_eq!(timeline.part_at(0.0), Some(0));
        assert_eq!(timeline.part_at(4.99), Some(0));
        assert_eq!(timeline.part_at(5.0), Some(1));
        assert_eq!(timeline.part_at(10.0), None);
        assert_eq!(timeline.part_at(-0.1), None);
    }

    #[test]
    fn test_from_parts_validates_partition() {
        let ok = SegmentTimeline::from_parts(
            10.0,
            vec![iv(0.0, 5.0), iv(5.0, 10.0)],
            vec![iv(5.0, 10.0), iv(5.0, 10.0)],
        )
        .unwrap();
        assert_eq!(ok.removed_parts(), &[iv(5.0, 10.0)]);

        let gap = SegmentTimeline::from_parts(10.0, vec![iv(0.0, 4.0), iv(5.0, 10.0)], vec![]);
        assert!(matches!(gap, Err(EditError::InvalidPartition { .. })));

        let short = SegmentTimeline::from_parts(10.0, vec![iv(0.0, 9.0)], vec![]);
        assert!(matches!(short, Err(EditError::InvalidPartition { .. })));

        let stray = SegmentTimeline::from_parts(10.0, vec![iv(0.0, 10.0)], vec![iv(0.0, 5.0)]);
        assert!(matches!(stray, Err(EditError::InvalidPartition { .. })));

        let empty = SegmentTimeline::from_parts(10.0, vec![], vec![]);
        assert!(matches!(empty, Err(EditError::InvalidPartition { .. })));
    }
}
