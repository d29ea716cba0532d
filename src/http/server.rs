//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (timeout, request ID,
//!   tracing)
//! - Spawn the health prober alongside the server
//! - Dispatch each inbound request: select a peer, forward, retry on peer
//!   failure, surface the final outcome

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::health::HealthProber;
use crate::http::request::{ensure_forwarded_for, RequestIdLayer, X_REQUEST_ID};
use crate::http::response;
use crate::observability::metrics;
use crate::upstream::PeerPool;

/// Inbound bodies are buffered up to this size so a request can be replayed
/// against another peer after a failed attempt.
const MAX_BUFFERED_BODY_BYTES: usize = 1024 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<PeerPool>,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    pool: Arc<PeerPool>,
}

impl HttpServer {
    /// Create a new HTTP server over a constructed peer pool.
    pub fn new(config: ProxyConfig, pool: Arc<PeerPool>) -> Self {
        let state = AppState {
            pool: Arc::clone(&pool),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            pool,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener until the
    /// shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if self.config.health_check.enabled {
            let prober = HealthProber::new(Arc::clone(&self.pool), self.config.health_check.clone());
            let prober_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                prober.run(prober_shutdown).await;
            });
        } else {
            tracing::info!("Health probing disabled");
        }

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let mut shutdown = shutdown;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main dispatch handler.
///
/// Selects a peer, forwards the request, and retries on peer failure up to
/// the pool size. A response is only committed to the client once a
/// forwarding attempt produced a non-503 status, so a failed attempt's
/// response is dropped here before any byte reaches the connection.
async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        remote = %remote,
        "Dispatching request"
    );

    let (mut parts, body) = request.into_parts();
    ensure_forwarded_for(&mut parts.headers, remote);

    // Buffered so the request can be rebuilt for each attempt.
    let body_bytes = match axum::body::to_bytes(body, MAX_BUFFERED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to buffer request body");
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    let max_attempts = state.pool.len();
    let mut attempts = 0;

    loop {
        let peer = match state.pool.next_alive() {
            Some(peer) => peer,
            None => {
                tracing::warn!(request_id = %request_id, "No alive peers in pool");
                metrics::record_request(&method, 503, "none", start);
                return response::no_backends();
            }
        };

        let mut builder = Request::builder()
            .method(parts.method.clone())
            .uri(parts.uri.clone())
            .version(parts.version);
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in parts.headers.iter() {
                headers.append(name.clone(), value.clone());
            }
        }
        let outbound = match builder.body(Body::from(body_bytes.clone())) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Failed to rebuild request");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let upstream_response = peer.forward(outbound).await;
        let status = upstream_response.status();

        if !response::is_upstream_failure(status) {
            metrics::record_request(&method, status.as_u16(), peer.url().as_str(), start);
            return upstream_response;
        }

        attempts += 1;
        tracing::warn!(
            request_id = %request_id,
            peer = %peer.url(),
            attempt = attempts,
            max_attempts = max_attempts,
            "Peer failed request, retrying"
        );

        if attempts >= max_attempts {
            metrics::record_request(&method, 503, "none", start);
            return response::all_backends_unavailable();
        }
    }
}
