// src/pipeline/sources.rs

//! Expansion of a Path Table `src` glob into concrete input files.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::debug;

use crate::fs::FileSystem;
use crate::watch::path_utils::to_slash;
use crate::watch::patterns::{compile_glob, glob_base, has_glob_meta};

/// One input file of a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path (project root joined).
    pub path: PathBuf,
    /// Path relative to the glob base; the output keeps this structure.
    pub rel: PathBuf,
    /// Path relative to the project root, forward slashes. Used for cache
    /// keys and log fields.
    pub display: String,
}

/// Expand `pattern` (relative to `root`) into the files it names, sorted.
///
/// - A pattern without wildcards names exactly one file, which must exist.
/// - A wildcard pattern may match nothing; dotfiles are never matched.
/// - Symlinked directories are not descended into. Symlinked files match.
pub fn expand_source_glob(fs: &dyn FileSystem, root: &Path, pattern: &str) -> Result<Vec<SourceFile>> {
    let base = glob_base(pattern);
    let base_dir = root.join(&base);

    if !has_glob_meta(pattern) {
        let path = root.join(pattern.trim_start_matches("./"));
        if !fs.is_file(&path) {
            bail!("source file not found: {pattern}");
        }
        let rel = path
            .strip_prefix(&base_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));
        let display = relative_display(root, &path);
        return Ok(vec![SourceFile { path, rel, display }]);
    }

    if !fs.is_dir(&base_dir) {
        return Ok(Vec::new());
    }

    let matcher = compile_glob(pattern.trim_start_matches("./"))?;
    let mut files = Vec::new();
    let mut stack = vec![base_dir.clone()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if is_hidden(&path) {
                continue;
            }
            if fs.is_dir(&path) {
                if fs.is_symlink(&path) {
                    debug!(dir = %relative_display(root, &path), "skipping symlinked directory");
                    continue;
                }
                stack.push(path);
            } else if fs.is_file(&path) {
                let display = relative_display(root, &path);
                if matcher.is_match(&display) {
                    let rel = path
                        .strip_prefix(&base_dir)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| path.clone());
                    files.push(SourceFile { path, rel, display });
                }
            }
        }
    }

    files.sort_by(|a, b| a.display.cmp(&b.display));
    Ok(files)
}

fn relative_display(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => to_slash(rel),
        Err(_) => to_slash(path),
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}
