// src/pipeline/mod.rs

//! Stage runners: one per [`AssetKind`].
//!
//! Each runner reads the sources named by its Path Table entry, transforms
//! them, and writes the results under the entry's `dest`, keeping the
//! directory structure below the source glob base. Runners are synchronous
//! and talk to the disk only through [`FileSystem`]; [`run_stage`] moves
//! them onto the blocking pool.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tracing::{debug, info};

use crate::cache::ImageCache;
use crate::config::model::{ConfigFile, PathEntry};
use crate::errors::{AssetpipeError, Result};
use crate::fs::FileSystem;
use crate::optimize::ImageOptimizer;
use crate::server::reload::{url_paths, ReloadHub};
use crate::types::AssetKind;

pub mod copy;
pub mod html;
pub mod images;
pub mod include;
pub mod output;
pub mod script;
pub mod sourcemap;
pub mod sources;
pub mod style;

pub use output::{CancelFlag, OutputWriter};

/// Everything a stage runner needs.
pub struct StageContext {
    /// Project root; every Path Table entry is relative to it.
    pub root: PathBuf,
    pub config: ConfigFile,
    pub fs: Arc<dyn FileSystem>,
    pub cache: Arc<ImageCache>,
    pub optimizer: Arc<dyn ImageOptimizer>,
    pub reload: ReloadHub,
}

impl fmt::Debug for StageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageContext")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl StageContext {
    pub fn entry(&self, kind: AssetKind) -> &PathEntry {
        self.config.paths().get(kind)
    }

    pub fn output_root(&self) -> PathBuf {
        self.root.join(&self.config.settings().output_root)
    }

    pub fn dest_dir(&self, kind: AssetKind) -> PathBuf {
        self.root.join(&self.entry(kind).dest)
    }
}

/// What one successful stage invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub kind: AssetKind,
    pub written: Vec<PathBuf>,
}

/// Run the stage for `kind` on the blocking pool, then tell live-reload
/// clients which URLs changed.
pub async fn run_stage(ctx: Arc<StageContext>, kind: AssetKind, cancel: CancelFlag) -> Result<StageReport> {
    let started = Instant::now();
    debug!(kind = %kind, "stage started");

    let job_ctx = Arc::clone(&ctx);
    let report = tokio::task::spawn_blocking(move || run_stage_blocking(&job_ctx, kind, &cancel))
        .await
        .map_err(|e| anyhow!("{kind} stage worker failed: {e}"))??;

    let urls = url_paths(&ctx.output_root(), &report.written);
    ctx.reload.publish(&urls);

    info!(
        kind = %kind,
        files = report.written.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "stage finished"
    );
    Ok(report)
}

/// Synchronous stage dispatch.
pub fn run_stage_blocking(ctx: &StageContext, kind: AssetKind, cancel: &CancelFlag) -> Result<StageReport> {
    let written = match kind {
        AssetKind::Html => html::run(ctx, cancel)?,
        AssetKind::Style => style::run(ctx, cancel)?,
        AssetKind::Js => script::run(ctx, cancel)?,
        AssetKind::Img => images::run(ctx, cancel)?,
        AssetKind::Static | AssetKind::Fonts => copy::run(ctx, kind, cancel)?,
    };
    Ok(StageReport { kind, written })
}

pub(crate) fn transform_error(kind: AssetKind, path: &Path, err: impl fmt::Display) -> AssetpipeError {
    AssetpipeError::Transform {
        kind,
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
