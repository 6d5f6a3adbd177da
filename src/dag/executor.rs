// src/dag/executor.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::scheduler::GraphScheduler;
use crate::dag::task::Node;
use crate::errors::{AssetpipeError, Result};

/// Executes a single graph node.
///
/// Production uses [`ProjectRunner`](crate::dag::ProjectRunner); tests can
/// substitute runners that record or fail on demand.
pub trait NodeRunner: Send + Sync + 'static {
    fn run(&self, node: Node) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;
}

/// Run every node of `graph`, starting each as soon as its dependencies
/// succeed. Independent nodes run concurrently.
///
/// Waits for all started nodes even after a failure, then fails with the
/// names of every failed node.
pub async fn run_graph<R: NodeRunner>(graph: &TaskGraph, runner: Arc<R>) -> Result<()> {
    let mut scheduler = GraphScheduler::new(graph);
    let mut running = JoinSet::new();

    loop {
        for node in scheduler.ready() {
            scheduler.start(node);
            info!(task = %node, "starting task");
            let work = runner.run(node);
            running.spawn(async move { (node, work.await) });
        }

        let Some(joined) = running.join_next().await else {
            break;
        };

        match joined {
            Ok((node, Ok(()))) => {
                info!(task = %node, "task finished");
                scheduler.complete(node, true);
            }
            Ok((node, Err(err))) => {
                error!(task = %node, error = %err, "task failed");
                for skipped in scheduler.complete(node, false) {
                    warn!(task = %skipped, failed_dependency = %node, "task skipped");
                }
            }
            Err(join_err) => {
                return Err(anyhow!("task worker panicked: {join_err}").into());
            }
        }
    }

    let failed = scheduler.failed();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(AssetpipeError::TasksFailed(
            failed.into_iter().map(|n| n.to_string()).collect(),
        ))
    }
}
