//! HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────┐
//!                      │                LOAD BALANCER                   │
//!                      │                                                │
//!   Client Request     │  ┌─────────┐    ┌────────────┐    ┌─────────┐ │
//!   ───────────────────┼─▶│  http   │───▶│  upstream  │───▶│  peer   │─┼──▶ Backend
//!                      │  │ server  │    │    pool    │    │ forward │ │    Server
//!                      │  └─────────┘    └────────────┘    └─────────┘ │
//!                      │       │          next_alive()          │      │
//!                      │       │◀── retry on peer failure ──────┘      │
//!                      │                                                │
//!                      │  ┌──────────────────────────────────────────┐ │
//!                      │  │  health prober: probe every peer on an   │ │
//!                      │  │  interval, write per-peer alive flags    │ │
//!                      │  └──────────────────────────────────────────┘ │
//!                      └───────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;

use load_balancer::config::{load_config, ProxyConfig};
use load_balancer::observability::{logging, metrics};
use load_balancer::upstream::{Peer, PeerPool};
use load_balancer::{HttpServer, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration comes from LB_CONFIG when set; otherwise the baked-in
    // defaults apply.
    let config = match std::env::var("LB_CONFIG") {
        Ok(path) => load_config(Path::new(&path))?,
        Err(_) => ProxyConfig::default(),
    };

    logging::init(&config.observability);

    tracing::info!("load-balancer v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstreams = config.upstreams.addresses.len(),
        probe_interval_secs = config.health_check.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // A bad peer address is fatal: better to refuse to start than to balance
    // over a partial peer set.
    let mut peers = Vec::with_capacity(config.upstreams.addresses.len());
    for address in &config.upstreams.addresses {
        let peer = Peer::new(address)?;
        tracing::info!(peer = %peer.url(), "Registered upstream peer");
        peers.push(Arc::new(peer));
    }
    let pool = Arc::new(PeerPool::new(peers));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.trigger();
        }
    });

    let server = HttpServer::new(config, pool);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
