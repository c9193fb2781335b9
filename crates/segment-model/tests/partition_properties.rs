use proptest::prelude::*;

use vidsplice_segment_model::{EditCommand, EditSignal, SegmentTimeline};

const LENGTH: f64 = 60.0;

#[derive(Debug, Clone)]
enum Op {
    Cut(f64),
    Uncut(usize),
    Mark(usize),
    Restore(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u32..600).prop_map(|tenths| Op::Cut(tenths as f64 / 10.0)),
        (0usize..16).prop_map(Op::Uncut),
        (0usize..16).prop_map(Op::Mark),
        (0usize..16).prop_map(Op::Restore),
    ]
}

fn run(timeline: &mut SegmentTimeline, op: &Op) {
    let len = timeline.parts().len();
    let _ = match *op {
        Op::Cut(t) => timeline.insert_cut(t),
        Op::Uncut(i) => match timeline.cuts().get(i % len.max(1)).copied() {
            Some(t) => timeline.remove_cut(t),
            None => return,
        },
        Op::Mark(i) => timeline.mark_removed(i % len),
        Op::Restore(i) => timeline.restore(i % len),
    };
}

fn assert_partition(timeline: &SegmentTimeline) {
    let parts = timeline.parts();
    assert!(!parts.is_empty());
    assert_eq!(parts[0].start(), 0.0);
    assert_eq!(parts[parts.len() - 1].end(), LENGTH);
    for pair in parts.windows(2) {
        assert_eq!(pair[0].end(), pair[1].start());
        assert!(pair[0].start() < pair[0].end());
    }
    for removed in timeline.removed_parts() {
        assert!(parts.contains(removed), "stale tombstone {removed:?}");
    }
    let mut sorted = timeline.removed_parts().to_vec();
    sorted.dedup();
    assert_eq!(sorted.len(), timeline.removed_parts().len());
}

proptest! {
    #[test]
    fn partition_holds_after_any_edit_sequence(ops in prop::collection::vec(op(), 0..40)) {
        let mut timeline = SegmentTimeline::new(LENGTH).unwrap();
        for op in &ops {
            run(&mut timeline, op);
            assert_partition(&timeline);
        }
    }

    #[test]
    fn repeated_cut_emits_once(tenths in 1u32..600) {
        let t = tenths as f64 / 10.0;
        let mut timeline = SegmentTimeline::new(LENGTH).unwrap();
        let first = timeline.apply(EditCommand::InsertCut(t)).unwrap();
        let second = timeline.apply(EditCommand::InsertCut(t)).unwrap();
        prop_assert_eq!(first.len(), 1);
        prop_assert!(second.is_empty());
        prop_assert_eq!(timeline.cuts(), vec![t]);
    }

    #[test]
    fn mark_is_idempotent_and_restore_undoes_it(
        cuts in prop::collection::vec(1u32..600, 0..8),
        pick in 0usize..8,
    ) {
        let mut timeline = SegmentTimeline::new(LENGTH).unwrap();
        for tenths in cuts {
            timeline.insert_cut(tenths as f64 / 10.0).unwrap();
        }
        let index = pick % timeline.parts().len();
        let before = timeline.clone();

        timeline.mark_removed(index).unwrap();
        timeline.mark_removed(index).unwrap();
        prop_assert_eq!(timeline.removed_parts().len(), 1);

        let signals = timeline.apply(EditCommand::Restore(index)).unwrap();
        prop_assert_eq!(signals, vec![EditSignal::RemovedPartsChanged(vec![])]);
        prop_assert_eq!(timeline, before);
    }

    #[test]
    fn cutting_never_changes_removed_coverage(
        ops in prop::collection::vec(op(), 0..20),
        tenths in 1u32..600,
    ) {
        let mut timeline = SegmentTimeline::new(LENGTH).unwrap();
        for op in &ops {
            run(&mut timeline, op);
        }
        let kept = timeline.kept_duration();
        timeline.insert_cut(tenths as f64 / 10.0).unwrap();
        prop_assert!((timeline.kept_duration() - kept).abs() < 1e-9);
    }
}
