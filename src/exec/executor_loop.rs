// src/exec/executor_loop.rs

//! Main executor loop that manages running stage invocations.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::engine::{RuntimeEvent, ScheduledStage};
use crate::exec::stage_runner::run_stage_instance;
use crate::pipeline::StageContext;
use crate::types::AssetKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorCommand {
    Run(ScheduledStage),
    Cancel(ScheduledStage),
}

/// Handle for a currently running stage invocation.
struct ActiveStage {
    invocation: u64,
    cancel: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

/// Spawn the background executor loop.
///
/// Per kind there is never more than one live invocation: a `Run` for a kind
/// whose previous invocation is still going cancels that one first.
pub fn spawn_executor(ctx: Arc<StageContext>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> mpsc::Sender<ExecutorCommand> {
    let (tx, mut rx) = mpsc::channel::<ExecutorCommand>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut active: HashMap<AssetKind, ActiveStage> = HashMap::new();

        while let Some(command) = rx.recv().await {
            match command {
                ExecutorCommand::Run(stage) => start_stage(stage, &ctx, &mut active, &runtime_tx),
                ExecutorCommand::Cancel(stage) => {
                    if let Some(existing) = active.get_mut(&stage.kind) {
                        if existing.invocation == stage.invocation {
                            cancel_active(stage.kind, existing);
                        }
                    }
                }
            }
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

fn start_stage(
    stage: ScheduledStage,
    ctx: &Arc<StageContext>,
    active: &mut HashMap<AssetKind, ActiveStage>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    if let Some(existing) = active.get_mut(&stage.kind) {
        if !existing.handle.is_finished() {
            cancel_active(stage.kind, existing);
        }
    }

    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(run_stage_instance(
        Arc::clone(ctx),
        stage,
        runtime_tx.clone(),
        cancel_rx,
    ));

    active.insert(
        stage.kind,
        ActiveStage {
            invocation: stage.invocation,
            cancel: Some(cancel_tx),
            handle,
        },
    );
}

fn cancel_active(kind: AssetKind, existing: &mut ActiveStage) {
    match existing.cancel.take() {
        Some(cancel) => {
            info!(kind = %kind, invocation = existing.invocation, "cancelling stage invocation");
            if cancel.send(()).is_err() {
                debug!(kind = %kind, invocation = existing.invocation, "invocation already finished");
            }
        }
        None => debug!(kind = %kind, invocation = existing.invocation, "invocation already cancelled"),
    }
}
