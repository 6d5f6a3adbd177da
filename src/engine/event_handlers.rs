// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{info, warn};

use crate::engine::queue::{CompletionDecision, StageQueue, TriggerDecision};
use crate::engine::{RuntimeOptions, ScheduledStage, StageOutcome, TriggerReason};
use crate::types::AssetKind;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start a stage invocation.
    Dispatch(ScheduledStage),
    /// Stop a running invocation; it must not write further outputs.
    Cancel(ScheduledStage),
    /// Request that the runtime exits (idle with `exit_when_idle`).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

pub fn handle_stage_trigger(queue: &mut StageQueue, kind: AssetKind, reason: TriggerReason) -> CoreStep {
    let commands = match queue.record_trigger(kind) {
        TriggerDecision::Start(invocation) => {
            info!(kind = %kind, invocation, ?reason, "starting stage");
            vec![CoreCommand::Dispatch(ScheduledStage { kind, invocation })]
        }
        TriggerDecision::Coalesced => {
            info!(kind = %kind, ?reason, "stage busy; rerun queued");
            Vec::new()
        }
        TriggerDecision::Restart { cancelled, started } => {
            info!(kind = %kind, cancelled, invocation = started, ?reason, "restarting stage");
            vec![
                CoreCommand::Cancel(ScheduledStage {
                    kind,
                    invocation: cancelled,
                }),
                CoreCommand::Dispatch(ScheduledStage {
                    kind,
                    invocation: started,
                }),
            ]
        }
    };
    CoreStep::continue_with(commands)
}

pub fn handle_stage_completion(
    queue: &mut StageQueue,
    options: &RuntimeOptions,
    kind: AssetKind,
    invocation: u64,
    outcome: StageOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    match queue.record_completion(kind, invocation) {
        CompletionDecision::Stale => return CoreStep::continue_with(commands),
        CompletionDecision::Finished { rerun } => {
            if outcome == StageOutcome::Failed {
                warn!(kind = %kind, invocation, "stage failed; waiting for the next change");
            }
            if let Some(next) = rerun {
                info!(kind = %kind, invocation = next, "starting queued rerun");
                commands.push(CoreCommand::Dispatch(ScheduledStage {
                    kind,
                    invocation: next,
                }));
            }
        }
    }

    if options.exit_when_idle && queue.is_idle() {
        commands.push(CoreCommand::RequestExit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }

    CoreStep::continue_with(commands)
}
