//! Request handling and transformation.
//!
//! # Responsibilities
//! - Stamp a unique request ID on every inbound request
//! - Record the client address when no upstream-visible identity exists
//!
//! # Design Decisions
//! - Request ID added as early as possible so every log line can carry it
//! - An existing x-request-id from the client is preserved, not replaced

use std::net::SocketAddr;
use std::task::{Context, Poll};

use axum::http::{HeaderMap, HeaderValue, Request};
use tower::{Layer, Service};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_REAL_IP: &str = "x-real-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Tower layer that stamps an `x-request-id` header on inbound requests.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Clone, Debug)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for RequestIdService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        if !request.headers().contains_key(X_REQUEST_ID) {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                request.headers_mut().insert(X_REQUEST_ID, value);
            }
        }
        self.inner.call(request)
    }
}

/// Record the inbound connection's address when the client carries no
/// identity of its own.
///
/// When `x-real-ip` is absent or empty, `x-forwarded-for` is set to the
/// observed remote IP. A request that already names its real IP passes
/// through untouched.
pub fn ensure_forwarded_for(headers: &mut HeaderMap, remote: SocketAddr) {
    let real_ip_missing = headers
        .get(X_REAL_IP)
        .map(|value| value.is_empty())
        .unwrap_or(true);

    if real_ip_missing {
        if let Ok(value) = HeaderValue::from_str(&remote.ip().to_string()) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> SocketAddr {
        "203.0.113.9:54321".parse().unwrap()
    }

    #[test]
    fn sets_forwarded_for_when_real_ip_absent() {
        let mut headers = HeaderMap::new();
        ensure_forwarded_for(&mut headers, remote());
        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "203.0.113.9");
    }

    #[test]
    fn sets_forwarded_for_when_real_ip_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REAL_IP, HeaderValue::from_static(""));
        ensure_forwarded_for(&mut headers, remote());
        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "203.0.113.9");
    }

    #[test]
    fn leaves_headers_alone_when_real_ip_present() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REAL_IP, HeaderValue::from_static("198.51.100.7"));
        ensure_forwarded_for(&mut headers, remote());
        assert!(headers.get(X_FORWARDED_FOR).is_none());
    }
}
