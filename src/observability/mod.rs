//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; level from config, overridable with
//!   RUST_LOG
//! - Metrics exposed in Prometheus format on a dedicated listener
//! - Probe outcomes and dispatch results are the two metric sources

pub mod logging;
pub mod metrics;
