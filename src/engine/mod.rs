// src/engine/mod.rs

//! Rebuild coordination for `watch`.
//!
//! Filesystem triggers arrive per [`AssetKind`]; the engine decides which
//! stage invocations to start or cancel so that each kind has at most one
//! invocation in flight. The pure state machine lives in [`core`]; the
//! async shell that talks to the executor is in [`runtime`].

use crate::types::AssetKind;

/// Outcome of one stage invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Success,
    Failed,
}

/// Why a stage was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// A watched file changed.
    FileWatch,
}

#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Stop once nothing is running or pending. `watch` keeps this off.
    pub exit_when_idle: bool,
}

/// One invocation of a stage runner.
///
/// `invocation` is unique for the lifetime of the engine, so completions of
/// superseded invocations can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduledStage {
    pub kind: AssetKind,
    pub invocation: u64,
}

/// Events flowing into the runtime from the watcher, executor and signals.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    StageTriggered {
        kind: AssetKind,
        reason: TriggerReason,
    },
    StageCompleted {
        kind: AssetKind,
        invocation: u64,
        outcome: StageOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::{CompletionDecision, StageQueue, TriggerDecision};
pub use crate::types::TriggerWhileRunningBehaviour;
pub use runtime::Runtime;
