// src/exec/backend.rs

//! Pluggable executor backend abstraction.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;

use crate::engine::{RuntimeEvent, ScheduledStage};
use crate::errors::Result;
use crate::pipeline::StageContext;

use super::executor_loop::{spawn_executor, ExecutorCommand};

/// How scheduled stage invocations are executed.
///
/// Production uses [`RealExecutorBackend`]; tests provide implementations
/// that record calls and report completions directly.
pub trait ExecutorBackend: Send {
    fn dispatch(&mut self, stage: ScheduledStage) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Stop `stage` if it is still running. Implementations must not report
    /// a completion for a cancelled invocation.
    fn cancel(&mut self, stage: ScheduledStage) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Forwards commands to the background executor loop.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ExecutorCommand>,
}

impl RealExecutorBackend {
    /// Spawns the executor loop immediately.
    pub fn new(ctx: Arc<StageContext>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            tx: spawn_executor(ctx, runtime_tx),
        }
    }

    fn send(&self, command: ExecutorCommand) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>> {
        let tx = self.tx.clone();
        Box::pin(async move {
            tx.send(command)
                .await
                .map_err(|e| anyhow!("executor loop is gone: {e}"))?;
            Ok(())
        })
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn dispatch(&mut self, stage: ScheduledStage) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.send(ExecutorCommand::Run(stage))
    }

    fn cancel(&mut self, stage: ScheduledStage) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.send(ExecutorCommand::Cancel(stage))
    }
}
