// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::types::AssetKind;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Async shell around [`CoreRuntime`]: reads events, feeds the core and
/// hands the resulting commands to an [`ExecutorBackend`].
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop. Returns when the core asks to stop or every event
    /// sender is gone.
    pub async fn run(mut self) -> Result<()> {
        info!("rebuild runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                let in_flight: Vec<&str> = AssetKind::ALL
                    .into_iter()
                    .filter(|kind| self.core.running(*kind).is_some())
                    .map(AssetKind::as_str)
                    .collect();
                info!(?in_flight, "stopping rebuild runtime");
                return Ok(());
            }
        }

        info!("runtime event channel closed; exiting");
        Ok(())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::Dispatch(stage) => {
                debug!(kind = %stage.kind, invocation = stage.invocation, "dispatching stage");
                self.executor.dispatch(stage).await
            }
            CoreCommand::Cancel(stage) => {
                debug!(kind = %stage.kind, invocation = stage.invocation, "cancelling stage");
                self.executor.cancel(stage).await
            }
            CoreCommand::RequestExit => {
                info!("engine idle; exit requested");
                Ok(())
            }
        }
    }
}
