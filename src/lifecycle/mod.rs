//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Construct peers → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → broadcast → server stops accepting, prober exits its loop
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error (bad config, bad peer address) is fatal
//! - Runtime errors never terminate the process

pub mod shutdown;

pub use shutdown::Shutdown;
