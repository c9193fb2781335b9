//! Edit commands and the signals they emit.
//!
//! `apply` is a pure transition: it never touches the input state and either
//! returns the next state together with the signals a UI should observe, or
//! an error with no state change at all.

use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::timeline::{EditError, Mutation, SegmentTimeline};

/// A user edit against a [`SegmentTimeline`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "arg", rename_all = "kebab-case")]
pub enum EditCommand {
    /// Cut at a timestamp (seconds).
    InsertCut(f64),
    /// Remove the cut at a timestamp (seconds).
    RemoveCut(f64),
    /// Tombstone a part by index.
    MarkRemoved(usize),
    /// Restore a part by index.
    Restore(usize),
    /// Toggle selection of a part by index.
    ToggleSelect(usize),
    /// Tombstone the selected part.
    RemoveSelected,
    /// Restore the selected part.
    RestoreSelected,
    /// Detach the current source.
    Eject,
    /// Run an export with the current removed parts.
    Export,
}

/// Observable outcome of an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", content = "payload", rename_all = "kebab-case")]
pub enum EditSignal {
    /// Partition after a cut or merge.
    PartsChanged(Vec<Interval>),
    /// Tombstones after a mark or restore.
    RemovedPartsChanged(Vec<Interval>),
    RequestEject,
    RequestExport,
}

/// Apply `command` to `state`, returning the next state and its signals.
pub fn apply(
    state: &SegmentTimeline,
    command: EditCommand,
) -> Result<(SegmentTimeline, Vec<EditSignal>), EditError> {
    let mut next = state.clone();
    let signals = next.apply(command)?;
    Ok((next, signals))
}

impl SegmentTimeline {
    /// Apply `command` in place and return the emitted signals.
    ///
    /// On error the timeline is unchanged.
    pub fn apply(&mut self, command: EditCommand) -> Result<Vec<EditSignal>, EditError> {
        let mutation = match command {
            EditCommand::InsertCut(t) => self.insert_cut(t)?,
            EditCommand::RemoveCut(t) => self.remove_cut(t)?,
            EditCommand::MarkRemoved(index) => self.mark_removed(index)?,
            EditCommand::Restore(index) => self.restore(index)?,
            EditCommand::ToggleSelect(index) => {
                self.toggle_select(index)?;
                Mutation::NONE
            }
            EditCommand::RemoveSelected => self.remove_selected()?,
            EditCommand::RestoreSelected => self.restore_selected()?,
            EditCommand::Eject => return Ok(vec![EditSignal::RequestEject]),
            EditCommand::Export => return Ok(vec![EditSignal::RequestExport]),
        };
        Ok(self.signals_for(mutation))
    }

    fn signals_for(&self, mutation: Mutation) -> Vec<EditSignal> {
        let mut signals = Vec::new();
        if mutation.parts_changed {
            signals.push(EditSignal::PartsChanged(self.parts().to_vec()));
        }
        if mutation.removed_changed {
            signals.push(EditSignal::RemovedPartsChanged(
                self.removed_parts().to_vec(),
            ));
        }
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: f64, end: f64) -> Interval {
        Interval::new(start, end).unwrap()
    }

    #[test]
    fn test_cut_mark_restore_scenario() {
        let state = SegmentTimeline::new(10.0).unwrap();

        let (state, signals) = apply(&state, EditCommand::InsertCut(5.0)).unwrap();
        assert_eq!(
            signals,
            vec![EditSignal::PartsChanged(vec![iv(0.0, 5.0), iv(5.0, 10.0)])]
        );

        let (state, signals) = apply(&state, EditCommand::MarkRemoved(1)).unwrap();
        assert_eq!(
            signals,
            vec![EditSignal::RemovedPartsChanged(vec![iv(5.0, 10.0)])]
        );

        let (_, signals) = apply(&state, EditCommand::Restore(1)).unwrap();
        assert_eq!(signals, vec![EditSignal::RemovedPartsChanged(vec![])]);
    }

    #[test]
    fn test_double_cut_emits_once() {
        let mut state = SegmentTimeline::new(10.0).unwrap();
        let mut emitted = Vec::new();
        emitted.extend(state.apply(EditCommand::InsertCut(5.0)).unwrap());
        emitted.extend(state.apply(EditCommand::InsertCut(5.0)).unwrap());
        assert_eq!(emitted.len(), 1);
    }

    #[test]
    fn test_remove_cut_emits_merged_partition() {
        let state = SegmentTimeline::from_parts(10.0, vec![iv(0.0, 5.0), iv(5.0, 10.0)], vec![])
            .unwrap();
        let (_, signals) = apply(&state, EditCommand::RemoveCut(5.0)).unwrap();
        assert_eq!(signals, vec![EditSignal::PartsChanged(vec![iv(0.0, 10.0)])]);
    }

    #[test]
    fn test_remove_cut_over_tombstone_emits_both() {
        let state = SegmentTimeline::from_parts(
            10.0,
            vec![iv(0.0, 5.0), iv(5.0, 10.0)],
            vec![iv(5.0, 10.0)],
        )
        .unwrap();
        let (next, signals) = apply(&state, EditCommand::RemoveCut(5.0)).unwrap();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[1], EditSignal::RemovedPartsChanged(vec![]));
        assert!(next.removed_parts().is_empty());
    }

    #[test]
    fn test_selection_is_silent() {
        let state = SegmentTimeline::new(10.0).unwrap();
        let (next, signals) = apply(&state, EditCommand::ToggleSelect(0)).unwrap();
        assert!(signals.is_empty());
        assert_eq!(next.selection(), Some(0));
        assert_eq!(state.selection(), None);
    }

    #[test]
    fn test_remove_selected_through_commands() {
        let mut state =
            SegmentTimeline::from_parts(10.0, vec![iv(0.0, 5.0), iv(5.0, 10.0)], vec![]).unwrap();
        state.apply(EditCommand::ToggleSelect(1)).unwrap();
        let signals = state.apply(EditCommand::RemoveSelected).unwrap();
        assert_eq!(
            signals,
            vec![EditSignal::RemovedPartsChanged(vec![iv(5.0, 10.0)])]
        );
        let signals = state.apply(EditCommand::RestoreSelected).unwrap();
        assert_eq!(signals, vec![EditSignal::RemovedPartsChanged(vec![])]);
    }

    #[test]
    fn test_error_leaves_state_untouched() {
        let state = SegmentTimeline::new(10.0).unwrap();
        assert!(apply(&state, EditCommand::InsertCut(12.0)).is_err());
        assert!(apply(&state, EditCommand::MarkRemoved(3)).is_err());

        let mut in_place = state.clone();
        assert!(in_place.apply(EditCommand::RemoveCut(5.0)).is_err());
        assert_eq!(in_place, state);
    }

    #[test]
    fn test_eject_and_export_requests() {
        let state = SegmentTimeline::new(10.0).unwrap();
        let (next, signals) = apply(&state, EditCommand::Eject).unwrap();
        assert_eq!(signals, vec![EditSignal::RequestEject]);
        assert_eq!(next, state);

        let (_, signals) = apply(&state, EditCommand::Export).unwrap();
        assert_eq!(signals, vec![EditSignal::RequestExport]);
    }

    #[test]
    fn test_signal_wire_format() {
        let json = serde_json::to_string(&EditSignal::RemovedPartsChanged(vec![iv(5.0, 10.0)]))
            .unwrap();
        assert_eq!(
            json,
            r#"{"signal":"removed-parts-changed","payload":[[5.0,10.0]]}"#
        );

        let cmd: EditCommand =
            serde_json::from_str(r#"{"command":"insert-cut","arg":2.5}"#).unwrap();
        assert_eq!(cmd, EditCommand::InsertCut(2.5));
        let cmd: EditCommand = serde_json::from_str(r#"{"command":"export"}"#).unwrap();
        assert_eq!(cmd, EditCommand::Export);
    }
}
