//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, dispatch + retry loop)
//!     → request.rs (request ID, client address recording)
//!     → upstream (peer selection, forwarding)
//!     → response.rs (failure classification, dispatcher 503s)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdLayer, X_FORWARDED_FOR, X_REAL_IP, X_REQUEST_ID};
pub use server::HttpServer;
