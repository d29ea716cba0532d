//! Health probing subsystem.
//!
//! # Data Flow
//! ```text
//! prober.rs:
//!     Startup probe pass, then periodic timer
//!     → one probe task per peer, launched concurrently
//!     → write peer alive flag
//!     → read by upstream::pool on later selections
//! ```
//!
//! # Design Decisions
//! - A single probe observation latches the flag directly; the dispatcher's
//!   per-request retry loop absorbs single-probe flakiness, so no
//!   consecutive-failure thresholds are kept
//! - Probes for distinct peers never wait on one another; a slow probe is
//!   bounded by its own timeout
//! - Overlapping observations of the same peer may race; last write wins

pub mod prober;

pub use prober::HealthProber;
