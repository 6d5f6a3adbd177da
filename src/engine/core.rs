// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! Consumes [`RuntimeEvent`]s and returns the commands the IO shell should
//! execute. No channels, no Tokio, no filesystem: everything here is unit
//! testable by feeding events and inspecting commands.

use crate::engine::event_handlers::{handle_stage_completion, handle_stage_trigger, CoreStep};
use crate::engine::queue::StageQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::types::{AssetKind, TriggerWhileRunningBehaviour};

#[derive(Debug)]
pub struct CoreRuntime {
    queue: StageQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(behaviour: TriggerWhileRunningBehaviour, options: RuntimeOptions) -> Self {
        Self {
            queue: StageQueue::new(behaviour),
            options,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_idle()
    }

    pub fn running(&self, kind: AssetKind) -> Option<u64> {
        self.queue.running(kind)
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::StageTriggered { kind, reason } => {
                handle_stage_trigger(&mut self.queue, kind, reason)
            }
            RuntimeEvent::StageCompleted {
                kind,
                invocation,
                outcome,
            } => handle_stage_completion(&mut self.queue, &self.options, kind, invocation, outcome),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CoreCommand, ScheduledStage, StageOutcome, TriggerReason};

    fn trigger(kind: AssetKind) -> RuntimeEvent {
        RuntimeEvent::StageTriggered {
            kind,
            reason: TriggerReason::FileWatch,
        }
    }

    fn completed(kind: AssetKind, invocation: u64) -> RuntimeEvent {
        RuntimeEvent::StageCompleted {
            kind,
            invocation,
            outcome: StageOutcome::Success,
        }
    }

    #[test]
    fn watch_mode_never_asks_to_exit() {
        let mut core = CoreRuntime::new(
            TriggerWhileRunningBehaviour::Queue,
            RuntimeOptions { exit_when_idle: false },
        );

        core.step(trigger(AssetKind::Fonts));
        let step = core.step(completed(AssetKind::Fonts, 1));

        assert!(step.keep_running);
        assert!(step.commands.is_empty());
        assert!(core.is_idle());
    }

    #[test]
    fn exit_when_idle_requests_exit_after_last_completion() {
        let mut core = CoreRuntime::new(
            TriggerWhileRunningBehaviour::Queue,
            RuntimeOptions { exit_when_idle: true },
        );

        core.step(trigger(AssetKind::Html));
        core.step(trigger(AssetKind::Js));

        let step = core.step(completed(AssetKind::Html, 1));
        assert!(step.keep_running);

        let step = core.step(completed(AssetKind::Js, 2));
        assert!(!step.keep_running);
        assert_eq!(step.commands, vec![CoreCommand::RequestExit]);
    }

    #[test]
    fn failed_stage_is_retried_on_next_trigger() {
        let mut core = CoreRuntime::new(
            TriggerWhileRunningBehaviour::Queue,
            RuntimeOptions { exit_when_idle: false },
        );

        core.step(trigger(AssetKind::Style));
        core.step(RuntimeEvent::StageCompleted {
            kind: AssetKind::Style,
            invocation: 1,
            outcome: StageOutcome::Failed,
        });
        let step = core.step(trigger(AssetKind::Style));

        assert_eq!(
            step.commands,
            vec![CoreCommand::Dispatch(ScheduledStage {
                kind: AssetKind::Style,
                invocation: 2
            })]
        );
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut core = CoreRuntime::new(
            TriggerWhileRunningBehaviour::Cancel,
            RuntimeOptions { exit_when_idle: false },
        );
        assert!(!core.step(RuntimeEvent::ShutdownRequested).keep_running);
    }
}
