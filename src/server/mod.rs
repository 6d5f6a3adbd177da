// src/server/mod.rs

//! Development server for the output root.
//!
//! Serves built files, injects the live-reload client into HTML pages and
//! streams [`ReloadEvent`]s to connected browsers over Server-Sent Events.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::Stream;
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

pub mod inject;
pub mod reload;
pub mod tunnel;

pub use inject::SnippetInjector;
pub use reload::{ReloadEvent, ReloadHub};

/// URL of the injected live-reload client.
pub const CLIENT_PATH: &str = "/__assetpipe/livereload.js";
/// SSE endpoint the client listens on.
pub const EVENTS_PATH: &str = "/__assetpipe/events";

#[derive(Clone)]
struct ServerState {
    root: Arc<PathBuf>,
    hub: ReloadHub,
    injector: Arc<SnippetInjector>,
}

/// A running dev server. Stops when dropped.
#[derive(Debug)]
pub struct DevServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl DevServer {
    /// Bind `host:port` (port `0` picks a free one) and serve `root`.
    pub async fn start(host: &str, port: u16, root: PathBuf, hub: ReloadHub) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("binding dev server to {host}:{port}"))?;
        let addr = listener.local_addr().context("reading dev server address")?;

        let state = ServerState {
            root: Arc::new(root.clone()),
            hub,
            injector: Arc::new(SnippetInjector::new()?),
        };
        let app = router(state);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "dev server stopped");
            }
        });

        info!(url = %format!("http://{addr}"), root = %root.display(), "dev server listening");
        Ok(Self { addr, handle })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for DevServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route(CLIENT_PATH, get(client_js))
        .route(EVENTS_PATH, get(events))
        .fallback(serve_file)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn client_js() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        inject::CLIENT_JS,
    )
        .into_response()
}

async fn events(State(state): State<ServerState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(listeners = state.hub.receiver_count() + 1, "live-reload client connected");
    let stream = BroadcastStream::new(state.hub.subscribe()).map(|item| {
        let event = match item {
            Ok(event) => event,
            // Missed events: the page can no longer be patched in place.
            Err(BroadcastStreamRecvError::Lagged(_)) => ReloadEvent::Reload { paths: Vec::new() },
        };
        Ok(sse_event(&event))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn sse_event(event: &ReloadEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event.name()).data(data)
}

async fn serve_file(State(state): State<ServerState>, uri: Uri) -> Response {
    let Some(mut path) = resolve_request_path(&state.root, uri.path()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
        path.push("index.html");
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let body = if mime.essence_str() == "text/html" {
        match String::from_utf8(bytes) {
            Ok(html) => state.injector.inject(&html).into_bytes(),
            Err(e) => e.into_bytes(),
        }
    } else {
        bytes
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        body,
    )
        .into_response()
}

/// Map a request path onto a file below `root`.
///
/// Returns `None` for paths that are not valid UTF-8 once decoded or that
/// try to leave the root.
fn resolve_request_path(root: &Path, uri_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(uri_path).decode_utf8().ok()?;
    let mut path = root.to_path_buf();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => path.push(name),
            _ => return None,
        }
    }
    Some(path)
}
