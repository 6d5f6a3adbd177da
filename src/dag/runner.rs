// src/dag/runner.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::info;

use crate::clean::clean_output;
use crate::dag::executor::NodeRunner;
use crate::dag::task::Node;
use crate::errors::Result;
use crate::pipeline::{run_stage, CancelFlag, StageContext};
use crate::watch::run_watch;

/// Runs graph nodes against one project.
#[derive(Debug, Clone)]
pub struct ProjectRunner {
    ctx: Arc<StageContext>,
}

impl ProjectRunner {
    pub fn new(ctx: Arc<StageContext>) -> Self {
        Self { ctx }
    }
}

impl NodeRunner for ProjectRunner {
    fn run(&self, node: Node) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>> {
        let ctx = Arc::clone(&self.ctx);
        Box::pin(async move {
            match node {
                Node::Clean => {
                    tokio::task::spawn_blocking(move || {
                        clean_output(ctx.fs.as_ref(), &ctx.root, &ctx.config.settings().output_root)
                    })
                    .await
                    .map_err(|e| anyhow!("clean worker failed: {e}"))??;
                    Ok(())
                }
                Node::Clear => {
                    let removed = tokio::task::spawn_blocking(move || ctx.cache.clear_all())
                        .await
                        .map_err(|e| anyhow!("clear worker failed: {e}"))??;
                    info!(removed, "image cache cleared");
                    Ok(())
                }
                Node::Stage(kind) => run_stage(ctx, kind, CancelFlag::new()).await.map(|_| ()),
                Node::Watch => run_watch(ctx).await,
            }
        })
    }
}
