//! A single upstream peer.
//!
//! # Responsibilities
//! - Hold the peer's parsed URL and a preconstructed forwarding client
//! - Track the peer's alive flag (written by the prober, read by the pool)
//! - Rewrite and forward inbound requests to the peer

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::body::Body;
use axum::http::uri::{Authority, Scheme};
use axum::http::{Request, Response, StatusCode, Uri};
use axum::response::IntoResponse;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

/// Error constructing a peer.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// The configured address is not a usable absolute HTTP URL.
    #[error("invalid upstream address '{0}'")]
    BadAddress(String),
}

/// One upstream origin server.
///
/// `url` and the forwarding client are fixed at construction; `alive` is the
/// only mutable field and is safe under concurrent read and write.
pub struct Peer {
    url: Url,
    scheme: Scheme,
    authority: Authority,
    base_path: String,
    client: Client<HttpConnector, Body>,
    alive: AtomicBool,
}

impl Peer {
    /// Parse `address` and build a peer with its forwarding client.
    ///
    /// Peers start alive; the first probe pass corrects the flag if the
    /// upstream is actually down.
    pub fn new(address: &str) -> Result<Self, PeerError> {
        let url = Url::parse(address).map_err(|_| PeerError::BadAddress(address.to_string()))?;

        let scheme = Scheme::try_from(url.scheme())
            .map_err(|_| PeerError::BadAddress(address.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| PeerError::BadAddress(address.to_string()))?;
        let authority = match url.port() {
            Some(port) => Authority::from_str(&format!("{host}:{port}")),
            None => Authority::from_str(host),
        }
        .map_err(|_| PeerError::BadAddress(address.to_string()))?;

        let base_path = url.path().trim_end_matches('/').to_string();

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            url,
            scheme,
            authority,
            base_path,
            client,
            alive: AtomicBool::new(true),
        })
    }

    /// The peer's configured URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Read the alive flag. Relaxed: a stale read just costs one retry.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Write the alive flag, returning the previous value so callers can log
    /// transitions.
    pub fn set_alive(&self, alive: bool) -> bool {
        self.alive.swap(alive, Ordering::Relaxed)
    }

    /// Rewrite the request target against this peer's URL.
    ///
    /// Scheme and authority are replaced; the peer's base path (if any) is
    /// joined with the inbound path; the query string is preserved.
    fn target_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let mut path_and_query = String::with_capacity(self.base_path.len() + inbound.path().len());
        path_and_query.push_str(&self.base_path);
        path_and_query.push_str(inbound.path());
        if let Some(query) = inbound.query() {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }

    /// Forward a request to this peer.
    ///
    /// Headers and body pass through unchanged; only the target is rewritten.
    /// A transport failure (connect error, reset, protocol error) is reported
    /// as a synthesized 503 response, which the dispatcher treats as a failed
    /// attempt. Any response the upstream actually produced is returned as-is.
    pub async fn forward(&self, request: Request<Body>) -> Response<Body> {
        let (mut parts, body) = request.into_parts();

        parts.uri = match self.target_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(peer = %self.url, error = %e, "Failed to build upstream target");
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
        };

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::warn!(peer = %self.url, error = %e, "Upstream request failed");
                StatusCode::SERVICE_UNAVAILABLE.into_response()
            }
        }
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("url", &self.url.as_str())
            .field("alive", &self.is_alive())
            .finish()
    }
}
