// src/server/reload.rs

//! Live-reload fan-out.
//!
//! Stage runners publish the URLs they just wrote; every connected browser
//! holds a receiver and gets one [`ReloadEvent`] per publish.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::watch::path_utils::relative_str;

const CHANNEL_CAPACITY: usize = 64;

/// What a connected page should do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadEvent {
    /// Re-fetch these stylesheets in place.
    Css { paths: Vec<String> },
    /// Reload the whole page.
    Reload { paths: Vec<String> },
}

impl ReloadEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            ReloadEvent::Css { .. } => "css",
            ReloadEvent::Reload { .. } => "reload",
        }
    }

    pub fn paths(&self) -> &[String] {
        match self {
            ReloadEvent::Css { paths } | ReloadEvent::Reload { paths } => paths,
        }
    }
}

/// Decide which event a set of written URLs produces.
///
/// Source maps never reach the page, so they are ignored. A write made only
/// of stylesheets can be injected; anything else needs a full reload.
pub fn classify(paths: &[String]) -> Option<ReloadEvent> {
    let relevant: Vec<String> = paths
        .iter()
        .filter(|p| !p.ends_with(".map"))
        .cloned()
        .collect();

    if relevant.is_empty() {
        return None;
    }

    if relevant.iter().all(|p| p.ends_with(".css")) {
        Some(ReloadEvent::Css { paths: relevant })
    } else {
        Some(ReloadEvent::Reload { paths: relevant })
    }
}

/// Map written files to the URL paths the dev server serves them under.
///
/// Files outside `output_root` are dropped.
pub fn url_paths(output_root: &Path, written: &[PathBuf]) -> Vec<String> {
    written
        .iter()
        .filter_map(|path| relative_str(output_root, path))
        .map(|rel| format!("/{rel}"))
        .collect()
}

/// Broadcast hub shared by the stage runners and the dev server.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadEvent>,
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Notify every listener about `paths`. Returns the event sent, if any.
    pub fn publish(&self, paths: &[String]) -> Option<ReloadEvent> {
        let event = classify(paths)?;
        match self.tx.send(event.clone()) {
            Ok(listeners) => info!(
                event = event.name(),
                files = event.paths().len(),
                listeners,
                "live reload"
            ),
            Err(_) => debug!(event = event.name(), "no live-reload listeners"),
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn css_only_writes_are_injected() {
        let event = classify(&strings(&["/style/main.css", "/style/map/main.css.map"]));
        assert_eq!(
            event,
            Some(ReloadEvent::Css {
                paths: strings(&["/style/main.css"])
            })
        );
    }

    #[test]
    fn anything_else_reloads() {
        let event = classify(&strings(&["/index.html"])).unwrap();
        assert_eq!(event.name(), "reload");
    }

    #[test]
    fn maps_alone_emit_nothing() {
        assert_eq!(classify(&strings(&["/js/map/main.js.map"])), None);
        assert_eq!(classify(&[]), None);
    }

    #[test]
    fn url_paths_are_rooted_at_output_root() {
        let urls = url_paths(
            Path::new("site/build"),
            &[
                PathBuf::from("site/build/index.html"),
                PathBuf::from("site/build/img/logo.png"),
                PathBuf::from("elsewhere/file.txt"),
            ],
        );
        assert_eq!(urls, strings(&["/index.html", "/img/logo.png"]));
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        hub.publish(&strings(&["/fonts/a.woff2"]));

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            ReloadEvent::Reload {
                paths: strings(&["/fonts/a.woff2"])
            }
        );
    }

    #[test]
    fn event_json_carries_type_and_paths() {
        let json = serde_json::to_string(&ReloadEvent::Css {
            paths: strings(&["/a.css"]),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"css","paths":["/a.css"]}"#);
    }
}
