// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::types::AssetKind;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{watch_roots, KindWatchProfile};

/// Keeps the debounced watcher alive. Dropping it stops file watching.
pub struct WatcherHandle {
    _inner: Debouncer<RecommendedWatcher>,
    roots: Vec<PathBuf>,
}

impl WatcherHandle {
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

/// Kinds whose watch glob matches any of `paths`.
pub fn kinds_for_paths(root: &Path, paths: &[PathBuf], profiles: &[KindWatchProfile]) -> BTreeSet<AssetKind> {
    let mut kinds = BTreeSet::new();
    for path in paths {
        let Some(rel) = relative_str(root, path) else {
            debug!(path = %path.display(), "change outside project root ignored");
            continue;
        };
        for profile in profiles.iter().filter(|p| p.matches(&rel)) {
            kinds.insert(profile.kind());
        }
    }
    kinds
}

/// Watch every directory covering the profiles' globs and send one
/// `StageTriggered` per affected kind for each debounced batch of changes.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profiles: Vec<KindWatchProfile>,
    debounce: Duration,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so event paths strip cleanly.
    let root = root.canonicalize().unwrap_or(root);

    let (batch_tx, mut batch_rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();

    let mut debouncer = new_debouncer(debounce, move |res: DebounceEventResult| match res {
        Ok(events) => {
            let paths = events.into_iter().map(|e| e.path).collect();
            if batch_tx.send(paths).is_err() {
                warn!("failed to forward file change batch");
            }
        }
        Err(err) => warn!(error = %err, "file watch error"),
    })
    .context("creating file watcher")?;

    let roots = watch_roots(&root, &profiles);
    for dir in &roots {
        debouncer
            .watcher()
            .watch(dir, RecursiveMode::Recursive)
            .with_context(|| format!("watching {}", dir.display()))?;
        info!(dir = %dir.display(), "watching for changes");
    }

    let profiles = Arc::new(profiles);
    let task_root = root.clone();
    tokio::spawn(async move {
        while let Some(paths) = batch_rx.recv().await {
            debug!(changed = paths.len(), "received debounced file changes");
            for kind in kinds_for_paths(&task_root, &paths, &profiles) {
                info!(kind = %kind, "change detected");
                let event = RuntimeEvent::StageTriggered {
                    kind,
                    reason: TriggerReason::FileWatch,
                };
                if runtime_tx.send(event).await.is_err() {
                    warn!("runtime gone; stopping watcher loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: debouncer,
        roots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles() -> Vec<KindWatchProfile> {
        vec![
            KindWatchProfile::new(AssetKind::Html, "src/**/*.html").unwrap(),
            KindWatchProfile::new(AssetKind::Style, "src/style/**/*.sass").unwrap(),
            KindWatchProfile::new(AssetKind::Fonts, "src/fonts/**/*.*").unwrap(),
        ]
    }

    #[test]
    fn maps_changes_to_their_kinds_once() {
        let root = Path::new("/project");
        let kinds = kinds_for_paths(
            root,
            &[
                PathBuf::from("/project/src/style/_vars.sass"),
                PathBuf::from("/project/src/style/main.sass"),
                PathBuf::from("/project/src/partials/nav.html"),
            ],
            &profiles(),
        );
        assert_eq!(kinds, BTreeSet::from([AssetKind::Html, AssetKind::Style]));
    }

    #[test]
    fn unmatched_and_outside_paths_are_ignored() {
        let root = Path::new("/project");
        let kinds = kinds_for_paths(
            root,
            &[
                PathBuf::from("/project/build/fonts/a.woff2"),
                PathBuf::from("/project/README.md"),
                PathBuf::from("/elsewhere/src/fonts/a.woff2"),
            ],
            &profiles(),
        );
        assert!(kinds.is_empty());
    }

    #[tokio::test]
    async fn new_file_triggers_its_kind() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/fonts")).unwrap();
        let (tx, mut rx) = mpsc::channel(8);

        let _handle = spawn_watcher(dir.path(), profiles(), Duration::from_millis(50), tx).unwrap();
        // Give the backend a moment to register before writing.
        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(dir.path().join("src/fonts/a.woff2"), b"font").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            RuntimeEvent::StageTriggered { kind, reason } => {
                assert_eq!(kind, AssetKind::Fonts);
                assert_eq!(reason, TriggerReason::FileWatch);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
