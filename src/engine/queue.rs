// src/engine/queue.rs

use tracing::debug;

use crate::types::{AssetKind, TriggerWhileRunningBehaviour};

/// What to do with a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Nothing was running for the kind; start this invocation.
    Start(u64),
    /// A run is in flight; one rerun is now pending (queue mode).
    Coalesced,
    /// The in-flight run is superseded by a fresh one (cancel mode).
    Restart { cancelled: u64, started: u64 },
}

/// What a completion means for the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDecision {
    /// Completion of an invocation that is no longer current; ignore it.
    Stale,
    /// The current invocation finished. `rerun` is the pending invocation
    /// to start next, if triggers arrived while it ran.
    Finished { rerun: Option<u64> },
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    running: Option<u64>,
    pending: bool,
}

/// Per-kind bookkeeping of in-flight and pending stage invocations.
///
/// Each kind has at most one invocation running. In `Queue` mode any number
/// of triggers during a run collapse into a single pending rerun. In
/// `Cancel` mode a trigger replaces the running invocation immediately.
#[derive(Debug)]
pub struct StageQueue {
    behaviour: TriggerWhileRunningBehaviour,
    slots: [Slot; AssetKind::ALL.len()],
    next_invocation: u64,
}

impl StageQueue {
    pub fn new(behaviour: TriggerWhileRunningBehaviour) -> Self {
        Self {
            behaviour,
            slots: [Slot::default(); AssetKind::ALL.len()],
            next_invocation: 1,
        }
    }

    /// Invocation currently in flight for `kind`.
    pub fn running(&self, kind: AssetKind) -> Option<u64> {
        self.slots[kind.index()].running
    }

    pub fn has_pending(&self, kind: AssetKind) -> bool {
        self.slots[kind.index()].pending
    }

    /// True when no kind is running or waiting for a rerun.
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(|s| s.running.is_none() && !s.pending)
    }

    pub fn record_trigger(&mut self, kind: AssetKind) -> TriggerDecision {
        let slot = &mut self.slots[kind.index()];

        let Some(current) = slot.running else {
            let started = bump(&mut self.next_invocation);
            slot.running = Some(started);
            return TriggerDecision::Start(started);
        };

        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                debug!(kind = %kind, invocation = current, already_pending = slot.pending, "coalescing trigger into pending rerun");
                slot.pending = true;
                TriggerDecision::Coalesced
            }
            TriggerWhileRunningBehaviour::Cancel => {
                let started = bump(&mut self.next_invocation);
                slot.running = Some(started);
                slot.pending = false;
                TriggerDecision::Restart {
                    cancelled: current,
                    started,
                }
            }
        }
    }

    pub fn record_completion(&mut self, kind: AssetKind, invocation: u64) -> CompletionDecision {
        let slot = &mut self.slots[kind.index()];

        if slot.running != Some(invocation) {
            debug!(kind = %kind, invocation, current = ?slot.running, "ignoring stale completion");
            return CompletionDecision::Stale;
        }

        if slot.pending {
            slot.pending = false;
            let rerun = bump(&mut self.next_invocation);
            slot.running = Some(rerun);
            CompletionDecision::Finished { rerun: Some(rerun) }
        } else {
            slot.running = None;
            CompletionDecision::Finished { rerun: None }
        }
    }
}

fn bump(counter: &mut u64) -> u64 {
    let value = *counter;
    *counter += 1;
    value
}
