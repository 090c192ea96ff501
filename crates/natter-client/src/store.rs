//! In-memory conversation logs.
//!
//! One ordered log per conversation, keyed by peer (or the public-room
//! sentinel). Order is receipt/append order — the store never sorts by
//! timestamp. Logs are created lazily on first reference and replaced
//! wholesale when persisted history arrives.

use std::collections::HashMap;

use natter_proto::{Envelope, PeerId, Timestamp};

/// Conversation identity: the shared public room or a private peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversationKey {
    /// The single shared broadcast conversation.
    Public,
    /// A private conversation keyed by peer.
    Peer(PeerId),
}

/// Ordered message logs for all conversations.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    logs: HashMap<ConversationKey, Vec<Envelope>>,
    dedup_window: usize,
}

impl ConversationStore {
    /// Create an empty store with the given trailing dedup window.
    pub fn new(dedup_window: usize) -> Self {
        Self { logs: HashMap::new(), dedup_window }
    }

    /// Append a message, creating the log lazily.
    pub fn append(&mut self, key: ConversationKey, envelope: Envelope) {
        self.logs.entry(key).or_default().push(envelope);
    }

    /// The log for a conversation, in append order. Empty when never
    /// referenced.
    pub fn history(&self, key: &ConversationKey) -> &[Envelope] {
        self.logs.get(key).map_or(&[], Vec::as_slice)
    }

    /// Mutable log access for status rewrites. `None` when never referenced.
    pub(crate) fn log_mut(&mut self, key: &ConversationKey) -> Option<&mut Vec<Envelope>> {
        self.logs.get_mut(key)
    }

    /// Replace a log wholesale with fetched history.
    ///
    /// Not a merge: optimistic local-only entries for the key are discarded
    /// in favor of what the external store returned.
    pub fn replace_history(&mut self, key: ConversationKey, messages: Vec<Envelope>) {
        self.logs.insert(key, messages);
    }

    /// Remove the message stamped `timestamp`. At most one entry is removed;
    /// unknown timestamps are a no-op. Returns whether a message was removed.
    pub fn remove(&mut self, key: &ConversationKey, timestamp: &Timestamp) -> bool {
        let Some(log) = self.logs.get_mut(key) else {
            return false;
        };
        match log.iter().position(|m| m.timestamp == *timestamp) {
            Some(index) => {
                log.remove(index);
                true
            },
            None => false,
        }
    }

    /// Empty a conversation log, keeping the key.
    pub fn clear(&mut self, key: &ConversationKey) {
        if let Some(log) = self.logs.get_mut(key) {
            log.clear();
        }
    }

    /// True when the frame repeats one of the last few stored entries.
    ///
    /// Re-delivery shows up as an identical `(sender, content, timestamp)`
    /// triple within a short recent window; older coincidences are treated
    /// as distinct events.
    pub fn is_duplicate(&self, key: &ConversationKey, envelope: &Envelope) -> bool {
        let log = self.history(key);
        let start = log.len().saturating_sub(self.dedup_window);
        log[start..].iter().any(|m| m.same_event(envelope))
    }
}
