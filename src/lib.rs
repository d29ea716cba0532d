//! HTTP load balancer library.
//!
//! A reverse-proxy load balancer built with Tokio and Axum: one listening
//! endpoint, a fixed set of upstream peers, atomic round-robin selection,
//! periodic liveness probing, and transparent per-request retry.

// Core subsystems
pub mod config;
pub mod http;
pub mod upstream;

// Traffic management
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use upstream::{Peer, PeerError, PeerPool};
