// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::AssetKind;

#[derive(Error, Debug)]
pub enum AssetpipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A transformer rejected one input file; the stage stops at that file.
    #[error("{kind} transform failed for {path}: {message}")]
    Transform {
        kind: AssetKind,
        path: String,
        message: String,
    },

    #[error("include error in {path}: {message}")]
    Include { path: String, message: String },

    /// The stage invocation was superseded; no further outputs are written.
    #[error("stage invocation cancelled")]
    Cancelled,

    #[error("task(s) failed: {}", .0.join(", "))]
    TasksFailed(Vec<String>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetpipeError>;
