//! Online-peer tracking.
//!
//! Membership only — no last-seen times. Entries are added on JOIN and
//! removed on LEAVE; the set is not persisted across reconnect and is
//! re-established via the join handshake.

use std::collections::HashSet;

use natter_proto::PeerId;

/// Set of currently-online peer identifiers.
#[derive(Debug, Clone, Default)]
pub struct Presence {
    online: HashSet<PeerId>,
}

impl Presence {
    /// Create an empty presence set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a peer as online. Idempotent.
    pub fn mark_online(&mut self, peer: PeerId) {
        self.online.insert(peer);
    }

    /// Record a peer as offline. Removing an absent peer is a no-op.
    pub fn mark_offline(&mut self, peer: &PeerId) {
        self.online.remove(peer);
    }

    /// Whether a peer is currently online.
    pub fn is_online(&self, peer: &PeerId) -> bool {
        self.online.contains(peer)
    }

    /// Drop all entries (connection teardown).
    pub fn clear(&mut self) {
        self.online.clear();
    }
}
