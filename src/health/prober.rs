//! Periodic liveness probing.
//!
//! # Responsibilities
//! - Probe every peer on an interval, starting immediately at launch
//! - Bound each probe with a hard timeout
//! - Update peer alive flags and log state transitions

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::observability::metrics;
use crate::upstream::{Peer, PeerPool};

pub struct HealthProber {
    pool: Arc<PeerPool>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthProber {
    pub fn new(pool: Arc<PeerPool>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            pool,
            config,
            client,
        }
    }

    /// Run the probe schedule until shutdown.
    ///
    /// The first interval tick completes immediately, which gives every peer
    /// an initial probe before the first full interval elapses.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            timeout_secs = self.config.timeout_secs,
            peers = self.pool.len(),
            "Health prober starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.probe_all();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health prober received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Launch one probe task per peer. Fire-and-forget: the ticker never
    /// waits on probe completion, so a slow peer cannot delay the others.
    fn probe_all(&self) {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        for peer in self.pool.peers() {
            let peer = Arc::clone(peer);
            let client = self.client.clone();
            tokio::spawn(async move {
                probe_peer(client, peer, timeout).await;
            });
        }
    }
}

/// Probe one peer and write the observation through to its alive flag.
///
/// Alive iff a response arrived within the deadline with a 2xx or 3xx status.
async fn probe_peer(client: Client<HttpConnector, Body>, peer: Arc<Peer>, timeout: Duration) {
    let request = match Request::get(peer.url().as_str())
        .header("user-agent", "load-balancer-health-probe")
        .body(Body::empty())
    {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(peer = %peer.url(), error = %e, "Failed to build probe request");
            return;
        }
    };

    let alive = match time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) => {
            let status = response.status();
            let healthy = status.is_success() || status.is_redirection();
            if !healthy {
                tracing::warn!(peer = %peer.url(), status = %status, "Probe returned unhealthy status");
            }
            healthy
        }
        Ok(Err(e)) => {
            tracing::warn!(peer = %peer.url(), error = %e, "Probe failed: connection error");
            false
        }
        Err(_) => {
            tracing::warn!(peer = %peer.url(), "Probe failed: timeout");
            false
        }
    };

    let was_alive = peer.set_alive(alive);
    if alive && !was_alive {
        tracing::info!(peer = %peer.url(), "Peer recovered");
    } else if !alive && was_alive {
        tracing::warn!(peer = %peer.url(), "Peer marked unhealthy");
    }

    metrics::record_peer_health(peer.url().as_str(), alive);
}
