use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use assetpipe::engine::{RuntimeEvent, ScheduledStage, StageOutcome};
use assetpipe::errors::Result;
use assetpipe::exec::ExecutorBackend;

/// A fake executor that:
/// - records which stages were dispatched and cancelled
/// - immediately reports StageCompleted(Success) for each dispatch.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<ScheduledStage>>>,
    cancelled: Arc<Mutex<Vec<ScheduledStage>>>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        dispatched: Arc<Mutex<Vec<ScheduledStage>>>,
        cancelled: Arc<Mutex<Vec<ScheduledStage>>>,
    ) -> Self {
        Self {
            runtime_tx,
            dispatched,
            cancelled,
        }
    }
}

impl ExecutorBackend for FakeExecutor {
    fn dispatch(
        &mut self,
        stage: ScheduledStage,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);

        Box::pin(async move {
            dispatched.lock().unwrap().push(stage);

            tx.send(RuntimeEvent::StageCompleted {
                kind: stage.kind,
                invocation: stage.invocation,
                outcome: StageOutcome::Success,
            })
            .await
            .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }

    fn cancel(
        &mut self,
        stage: ScheduledStage,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let cancelled = Arc::clone(&self.cancelled);
        Box::pin(async move {
            cancelled.lock().unwrap().push(stage);
            Ok(())
        })
    }
}
