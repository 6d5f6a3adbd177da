// src/server/tunnel.rs

//! Public URL for the dev server through a localtunnel-compatible service.
//!
//! The service hands out a subdomain plus a TCP port; the client keeps
//! `max_conn_count` connections open to that port and pipes each one into
//! the local server once the first request bytes arrive.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_CONNECTIONS: u32 = 10;

/// Response of `GET {host}/?new`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TunnelGrant {
    pub id: String,
    pub port: u16,
    #[serde(default)]
    pub max_conn_count: Option<u32>,
    pub url: String,
}

impl TunnelGrant {
    fn connections(&self) -> u32 {
        self.max_conn_count.unwrap_or(1).clamp(1, MAX_CONNECTIONS)
    }
}

/// Open tunnel. Connections are torn down when dropped.
#[derive(Debug)]
pub struct TunnelHandle {
    url: String,
    workers: Vec<JoinHandle<()>>,
}

impl TunnelHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TunnelHandle {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

/// Ask `tunnel_host` for a public URL and start proxying to `local`.
pub async fn open(tunnel_host: &str, local: SocketAddr) -> Result<TunnelHandle> {
    let base = tunnel_host.trim_end_matches('/');
    let remote_host = reqwest::Url::parse(base)
        .with_context(|| format!("invalid tunnel host {base:?}"))?
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("tunnel host {base:?} has no hostname"))?;

    let grant: TunnelGrant = reqwest::get(format!("{base}/?new"))
        .await
        .with_context(|| format!("requesting tunnel from {base}"))?
        .error_for_status()
        .context("tunnel service refused the request")?
        .json()
        .await
        .context("decoding tunnel grant")?;

    let local = loopback_if_unspecified(local);
    let workers = (0..grant.connections())
        .map(|_| tokio::spawn(keep_connected(remote_host.clone(), grant.port, local)))
        .collect();

    info!(url = %grant.url, id = %grant.id, connections = grant.connections(), "tunnel open");
    Ok(TunnelHandle {
        url: grant.url,
        workers,
    })
}

fn loopback_if_unspecified(addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        SocketAddr::from((Ipv4Addr::LOCALHOST, addr.port()))
    } else {
        addr
    }
}

async fn keep_connected(remote_host: String, remote_port: u16, local: SocketAddr) {
    loop {
        if let Err(e) = proxy_one(&remote_host, remote_port, local).await {
            debug!(error = %e, "tunnel connection closed");
        }
        tokio::time::sleep(RETRY_DELAY).await;
    }
}

async fn proxy_one(remote_host: &str, remote_port: u16, local: SocketAddr) -> Result<()> {
    let mut upstream = TcpStream::connect((remote_host, remote_port))
        .await
        .with_context(|| format!("connecting to tunnel {remote_host}:{remote_port}"))?;

    // Local connections are opened lazily so idle slots do not hit the
    // server's header timeout.
    upstream.readable().await.context("waiting for tunnel traffic")?;

    let mut downstream = TcpStream::connect(local)
        .await
        .with_context(|| format!("connecting to local server {local}"))?;

    let (up, down) = tokio::io::copy_bidirectional(&mut upstream, &mut downstream)
        .await
        .context("proxying tunnel connection")?;
    debug!(bytes_in = up, bytes_out = down, "tunnel request finished");
    Ok(())
}
