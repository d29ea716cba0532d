//! Upstream peer management.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → pool.rs (advance cursor, skip dead peers)
//!     → peer.rs (rewrite target, forward to the selected upstream)
//!     → Response back to the dispatcher
//!
//! Health prober (health/prober.rs)
//!     → peer.rs set_alive()
//!     → read by pool.rs next_alive() on later selections
//! ```
//!
//! # Design Decisions
//! - The alive flag lives on the peer, not the pool: the selection loop reads
//!   one location per candidate and the prober writes one location per probe,
//!   with no cross-component locking
//! - The peer sequence is immutable after pool construction; the cursor is the
//!   pool's only mutable state
//! - Each peer owns a preconstructed HTTP client bound to its URL

pub mod peer;
pub mod pool;

pub use peer::{Peer, PeerError};
pub use pool::PeerPool;
