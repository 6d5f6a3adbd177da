// src/exec/stage_runner.rs

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::engine::{RuntimeEvent, ScheduledStage, StageOutcome};
use crate::errors::AssetpipeError;
use crate::pipeline::{run_stage, CancelFlag, StageContext};

/// Run one stage invocation and report its outcome to the runtime.
///
/// If `cancel_rx` fires first, the invocation's output writer is shut and
/// **no** `StageCompleted` is sent; the runtime has already moved on.
pub async fn run_stage_instance(
    ctx: Arc<StageContext>,
    stage: ScheduledStage,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let flag = CancelFlag::new();
    let work = run_stage(ctx, stage.kind, flag.clone());
    tokio::pin!(work);

    let result = tokio::select! {
        result = &mut work => result,
        Ok(()) = &mut cancel_rx => {
            flag.cancel();
            info!(kind = %stage.kind, invocation = stage.invocation, "stage invocation cancelled");
            return;
        }
    };

    let outcome = match result {
        Ok(_) => StageOutcome::Success,
        Err(AssetpipeError::Cancelled) => {
            debug!(kind = %stage.kind, invocation = stage.invocation, "stage stopped after cancellation");
            return;
        }
        Err(err) => {
            error!(kind = %stage.kind, invocation = stage.invocation, error = %err, "stage failed");
            StageOutcome::Failed
        }
    };

    let event = RuntimeEvent::StageCompleted {
        kind: stage.kind,
        invocation: stage.invocation,
        outcome,
    };
    if runtime_tx.send(event).await.is_err() {
        debug!(kind = %stage.kind, "runtime gone before stage completion was delivered");
    }
}
