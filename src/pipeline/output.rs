// src/pipeline/output.rs

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{AssetpipeError, Result};
use crate::fs::FileSystem;

/// Shared cancellation flag for one stage invocation.
///
/// Set by the executor when a newer invocation of the same kind supersedes
/// this one; checked before every output write.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Writes stage outputs and remembers what was written.
#[derive(Debug)]
pub struct OutputWriter<'a> {
    fs: &'a dyn FileSystem,
    cancel: &'a CancelFlag,
    written: Vec<PathBuf>,
}

impl<'a> OutputWriter<'a> {
    pub fn new(fs: &'a dyn FileSystem, cancel: &'a CancelFlag) -> Self {
        Self {
            fs,
            cancel,
            written: Vec::new(),
        }
    }

    /// Refuses with [`AssetpipeError::Cancelled`] once the flag is set.
    pub fn write(&mut self, path: &Path, contents: &[u8]) -> Result<()> {
        self.ensure_live()?;
        self.fs.write(path, contents)?;
        self.written.push(path.to_path_buf());
        Ok(())
    }

    pub fn ensure_live(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(AssetpipeError::Cancelled);
        }
        Ok(())
    }

    pub fn into_written(self) -> Vec<PathBuf> {
        self.written
    }
}
