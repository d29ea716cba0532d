//! Peer pool and round-robin selection.
//!
//! # Responsibilities
//! - Own the ordered, immutable peer sequence
//! - Advance the shared selection cursor atomically
//! - Select the next alive peer, skipping dead ones

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::upstream::peer::Peer;

/// The process-wide peer set plus its selection cursor.
///
/// The peer sequence never changes after construction, so it is shared
/// without locking; the cursor is the only mutable state.
#[derive(Debug)]
pub struct PeerPool {
    peers: Vec<Arc<Peer>>,
    cursor: AtomicUsize,
}

impl PeerPool {
    /// Build a pool over a fixed peer sequence. An empty pool is legal and
    /// always reports no peer from selection.
    pub fn new(peers: Vec<Arc<Peer>>) -> Self {
        Self {
            peers,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// All peers, in configuration order. Used by the health prober.
    pub fn peers(&self) -> &[Arc<Peer>] {
        &self.peers
    }

    /// Atomically advance the cursor and reduce it to an index.
    ///
    /// The modulo happens on read, so wraparound of the unsigned counter never
    /// produces an out-of-range index. Must not be called on an empty pool.
    fn advance(&self) -> usize {
        let cursor = self.cursor.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        cursor % self.peers.len()
    }

    /// Select the next peer whose alive flag reads true.
    ///
    /// Advances the cursor at least once and at most `len` times; returns
    /// `None` when the pool is empty or every peer was observed dead. Never
    /// blocks.
    pub fn next_alive(&self) -> Option<Arc<Peer>> {
        if self.peers.is_empty() {
            return None;
        }

        for _ in 0..self.peers.len() {
            let index = self.advance();
            let peer = &self.peers[index];
            if peer.is_alive() {
                return Some(Arc::clone(peer));
            }
        }
        None
    }
}
