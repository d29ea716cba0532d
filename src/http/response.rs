//! Response classification and the dispatcher's own error responses.
//!
//! # Design Decisions
//! - A 503 from a forwarding attempt marks the peer as having failed that
//!   request; every other status, 4xx and 5xx included, is a legitimate
//!   upstream response and flows through verbatim
//! - The two 503 bodies the dispatcher emits itself are distinguishable, so
//!   a client can tell "nothing was selectable" from "every attempt failed"

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;

pub const NO_BACKENDS_BODY: &str = "No backends available";
pub const ALL_BACKENDS_BODY: &str = "All backends unavailable";

/// Whether a forwarding attempt's status means the peer failed this request.
pub fn is_upstream_failure(status: StatusCode) -> bool {
    status == StatusCode::SERVICE_UNAVAILABLE
}

/// 503 emitted when selection found no alive peer before any attempt.
pub fn no_backends() -> Response<Body> {
    (StatusCode::SERVICE_UNAVAILABLE, NO_BACKENDS_BODY).into_response()
}

/// 503 emitted when every attempt in the retry loop failed.
pub fn all_backends_unavailable() -> Response<Body> {
    (StatusCode::SERVICE_UNAVAILABLE, ALL_BACKENDS_BODY).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_503_counts_as_upstream_failure() {
        assert!(is_upstream_failure(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_upstream_failure(StatusCode::OK));
        assert!(!is_upstream_failure(StatusCode::NOT_FOUND));
        assert!(!is_upstream_failure(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_upstream_failure(StatusCode::BAD_GATEWAY));
    }
}
