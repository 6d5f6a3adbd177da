// src/exec/mod.rs

//! Stage execution layer for `watch`.
//!
//! - [`executor_loop`] owns the running stage invocations, at most one per
//!   kind, and cancels superseded ones.
//! - [`stage_runner`] runs one invocation and reports its completion back to
//!   the runtime.
//! - [`backend`] provides the [`ExecutorBackend`] seam the runtime talks to,
//!   so tests can substitute a fake executor.

pub mod backend;
pub mod executor_loop;
pub mod stage_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::{spawn_executor, ExecutorCommand};
