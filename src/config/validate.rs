// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use crate::config::model::{ConfigFile, PathEntry, PathTable, RawConfigFile};
use crate::errors::{AssetpipeError, Result};
use crate::pipeline::style::browser_targets;
use crate::types::AssetKind;
use crate::watch::patterns::compile_glob;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetpipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_global_config(&raw)?;
        validate_style(&raw)?;
        let paths = validate_path_table(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.server, raw.style, paths))
    }
}

fn config_error(msg: impl Into<String>) -> AssetpipeError {
    AssetpipeError::ConfigError(msg.into())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let output_root = &cfg.config.output_root;
    check_relative_path("[config].output_root", output_root)?;
    if normalized(output_root).as_os_str().is_empty() {
        return Err(config_error(format!(
            "[config].output_root must name a directory below the project root (got {output_root:?})"
        )));
    }

    check_relative_path("[config].cache_dir", &cfg.config.cache_dir)?;

    if cfg.config.debounce_ms == 0 {
        return Err(config_error("[config].debounce_ms must be >= 1 (got 0)"));
    }

    Ok(())
}

fn validate_style(cfg: &RawConfigFile) -> Result<()> {
    if cfg.style.browsers.is_empty() {
        return Err(config_error("[style].browsers must contain at least one query"));
    }
    browser_targets(&cfg.style.browsers).map_err(|e| config_error(format!("[style].browsers: {e}")))?;
    Ok(())
}

/// Every kind must have exactly one complete entry, and every output must
/// land inside the output root so `clean` removes it.
fn validate_path_table(cfg: &RawConfigFile) -> Result<PathTable> {
    let output_root = normalized(&cfg.config.output_root);
    let mut entries = Vec::with_capacity(AssetKind::ALL.len());

    for kind in AssetKind::ALL {
        let entry = cfg
            .path
            .get(&kind)
            .ok_or_else(|| config_error(format!("path table has no entry for kind '{kind}'")))?;
        validate_entry(kind, entry, &output_root)?;
        entries.push(entry.clone());
    }

    let entries: [PathEntry; 6] = entries
        .try_into()
        .map_err(|_| config_error("path table must have exactly one entry per kind"))?;
    Ok(PathTable::new_unchecked(entries))
}

fn validate_entry(kind: AssetKind, entry: &PathEntry, output_root: &Path) -> Result<()> {
    for (field, value) in [("src", &entry.src), ("dest", &entry.dest), ("watch", &entry.watch)] {
        if value.trim().is_empty() {
            return Err(config_error(format!("[path.{kind}].{field} must not be empty")));
        }
    }

    for (field, pattern) in [("src", &entry.src), ("watch", &entry.watch)] {
        compile_glob(pattern)
            .map_err(|e| config_error(format!("[path.{kind}].{field}: {e:#}")))?;
    }

    check_relative_path(&format!("[path.{kind}].dest"), &entry.dest)?;
    if !normalized(&entry.dest).starts_with(output_root) {
        return Err(config_error(format!(
            "[path.{kind}].dest {:?} is outside output_root {:?}",
            entry.dest,
            output_root.display()
        )));
    }

    if let Some(dir) = &entry.source_maps {
        check_relative_path(&format!("[path.{kind}].source_maps"), dir)?;
    }

    Ok(())
}

/// Reject empty, absolute and `..`-containing paths.
fn check_relative_path(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(config_error(format!("{field} must not be empty")));
    }
    let path = Path::new(value);
    if path.is_absolute() || path.has_root() {
        return Err(config_error(format!(
            "{field} must be relative to the project root (got {value:?})"
        )));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(config_error(format!(
            "{field} must not contain '..' (got {value:?})"
        )));
    }
    Ok(())
}

/// Drop `.` components so `./build/` and `build` compare equal.
fn normalized(value: &str) -> PathBuf {
    Path::new(value)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
