// src/watch/controller.rs

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::Result;
use crate::exec::RealExecutorBackend;
use crate::pipeline::StageContext;
use crate::server::{tunnel, DevServer};
use crate::watch::patterns::build_profiles_from_config;
use crate::watch::watcher::spawn_watcher;

/// Serve the output root, optionally tunnel it, and rebuild each kind when
/// its watched files change. Runs until Ctrl-C.
///
/// Wires together:
/// - the dev server and live-reload hub
/// - the public tunnel (best effort)
/// - the debounced file watcher
/// - the rebuild runtime and its executor
pub async fn run_watch(ctx: Arc<StageContext>) -> Result<()> {
    let server_cfg = ctx.config.server().clone();
    let settings = ctx.config.settings().clone();

    let output_root = ctx.output_root();
    tokio::fs::create_dir_all(&output_root)
        .await
        .with_context(|| format!("creating output root {}", output_root.display()))?;

    let server = DevServer::start(&server_cfg.host, server_cfg.port, output_root, ctx.reload.clone()).await?;

    let _tunnel = if server_cfg.tunnel {
        match tunnel::open(&server_cfg.tunnel_host, server.addr()).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "tunnel unavailable; serving locally only");
                None
            }
        }
    } else {
        None
    };

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let profiles = build_profiles_from_config(&ctx.config)?;
    let watcher = spawn_watcher(
        ctx.root.clone(),
        profiles,
        Duration::from_millis(settings.debounce_ms),
        rt_tx.clone(),
    )?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let executor = RealExecutorBackend::new(Arc::clone(&ctx), rt_tx);
    let core = CoreRuntime::new(
        settings.triggered_while_running_behaviour,
        RuntimeOptions { exit_when_idle: false },
    );

    info!(
        url = %server.url(),
        dirs = watcher.roots().len(),
        behaviour = ?settings.triggered_while_running_behaviour,
        "watching"
    );
    Runtime::new(core, rt_rx, executor).run().await
}
