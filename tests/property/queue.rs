use proptest::prelude::*;
use assetpipe::engine::{CompletionDecision, StageQueue, TriggerDecision};
use assetpipe::types::{AssetKind, TriggerWhileRunningBehaviour};

#[derive(Debug, Clone, Copy)]
enum Op {
    Trigger(AssetKind),
    // Completes whatever is running for the kind, if anything.
    Complete(AssetKind),
    // Reports an invocation that was never current.
    Stale(AssetKind),
}

fn note_start(invocation: u64, last: &mut u64, started: &mut usize) {
    assert!(invocation > *last, "invocation ids must increase");
    *last = invocation;
    *started += 1;
}

fn kind_strategy() -> impl Strategy<Value = AssetKind> {
    (0..AssetKind::ALL.len()).prop_map(|i| AssetKind::ALL[i])
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => kind_strategy().prop_map(Op::Trigger),
        3 => kind_strategy().prop_map(Op::Complete),
        1 => kind_strategy().prop_map(Op::Stale),
    ]
}

fn behaviour_strategy() -> impl Strategy<Value = TriggerWhileRunningBehaviour> {
    prop_oneof![
        Just(TriggerWhileRunningBehaviour::Queue),
        Just(TriggerWhileRunningBehaviour::Cancel),
    ]
}

proptest! {
    #[test]
    fn queue_keeps_one_invocation_per_kind_and_drains(
        behaviour in behaviour_strategy(),
        ops in proptest::collection::vec(op_strategy(), 1..64),
    ) {
        let mut queue = StageQueue::new(behaviour);
        let mut triggers = 0usize;
        let mut started = 0usize;
        let mut last_invocation = 0u64;

        for op in ops {
            match op {
                Op::Trigger(kind) => {
                    triggers += 1;
                    let before = queue.running(kind);
                    match queue.record_trigger(kind) {
                        TriggerDecision::Start(id) => {
                            prop_assert!(before.is_none());
                            note_start(id, &mut last_invocation, &mut started);
                        }
                        TriggerDecision::Coalesced => {
                            prop_assert_eq!(behaviour, TriggerWhileRunningBehaviour::Queue);
                            prop_assert!(queue.has_pending(kind));
                            prop_assert_eq!(queue.running(kind), before);
                        }
                        TriggerDecision::Restart { cancelled, started: id } => {
                            prop_assert_eq!(behaviour, TriggerWhileRunningBehaviour::Cancel);
                            prop_assert_eq!(Some(cancelled), before);
                            note_start(id, &mut last_invocation, &mut started);
                        }
                    }
                }
                Op::Complete(kind) => {
                    if let Some(current) = queue.running(kind) {
                        let pending = queue.has_pending(kind);
                        match queue.record_completion(kind, current) {
                            CompletionDecision::Finished { rerun: Some(id) } => {
                                prop_assert!(pending);
                                note_start(id, &mut last_invocation, &mut started);
                            }
                            CompletionDecision::Finished { rerun: None } => {
                                prop_assert!(!pending);
                                prop_assert_eq!(queue.running(kind), None);
                            }
                            CompletionDecision::Stale => {
                                prop_assert!(false, "current invocation reported stale");
                            }
                        }
                    }
                }
                Op::Stale(kind) => {
                    let before = queue.running(kind);
                    prop_assert_eq!(queue.record_completion(kind, u64::MAX), CompletionDecision::Stale);
                    prop_assert_eq!(queue.running(kind), before);
                }
            }

            prop_assert!(started <= triggers, "more dispatches than triggers");
        }

        // Let every in-flight invocation finish; pending reruns run once more.
        for _ in 0..2 {
            for kind in AssetKind::ALL {
                if let Some(current) = queue.running(kind) {
                    if let CompletionDecision::Finished { rerun: Some(id) } = queue.record_completion(kind, current) {
                        note_start(id, &mut last_invocation, &mut started);
                    }
                }
            }
        }

        prop_assert!(queue.is_idle());
        prop_assert!(started <= triggers);
    }
}
