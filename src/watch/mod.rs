// src/watch/mod.rs

//! Watch Controller.
//!
//! - [`patterns`] compiles the Path Table's watch globs per kind.
//! - [`watcher`] turns debounced filesystem changes into per-kind triggers.
//! - [`controller`] starts the dev server, tunnel, watcher and rebuild
//!   runtime for the `watch` task.
//!
//! It does **not** decide how overlapping rebuilds behave; that lives in
//! [`crate::engine`].

pub mod controller;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use controller::run_watch;
pub use patterns::{build_profiles_from_config, KindWatchProfile};
pub use watcher::{kinds_for_paths, spawn_watcher, WatcherHandle};
