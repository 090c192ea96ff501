//! Inbound typing indicators with tick-driven expiry.
//!
//! An explicit deadline map replaces ad hoc timer handles: each conversation
//! holds at most one entry, a refresh restarts its lifetime rather than
//! stacking a second timer, and `clear_all` on teardown guarantees no expiry
//! ever fires against a torn-down connection. Distinct from the outbound
//! typing throttle, which lives with the composer.

use std::{collections::HashMap, ops::Sub, time::Duration};

use crate::store::ConversationKey;

#[derive(Debug, Clone)]
struct TypingEntry<I> {
    label: String,
    refreshed_at: I,
}

/// Per-conversation "who is typing" state.
///
/// Generic over the instant type so tests drive a virtual clock.
#[derive(Debug, Clone)]
pub struct TypingCoordinator<I> {
    entries: HashMap<ConversationKey, TypingEntry<I>>,
}

impl<I> TypingCoordinator<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Record a typing indicator, restarting the lifetime of any existing
    /// entry for the conversation.
    pub fn set(&mut self, key: ConversationKey, label: String, now: I) {
        self.entries.insert(key, TypingEntry { label, refreshed_at: now });
    }

    /// The indicator label for a conversation, if one is live.
    pub fn indicator(&self, key: &ConversationKey) -> Option<&str> {
        self.entries.get(key).map(|entry| entry.label.as_str())
    }

    /// Drop every entry whose quiet period has elapsed.
    pub fn expire(&mut self, now: I, expiry: Duration) {
        self.entries.retain(|_, entry| now - entry.refreshed_at < expiry);
    }

    /// Drop one conversation's indicator.
    pub fn clear(&mut self, key: &ConversationKey) {
        self.entries.remove(key);
    }

    /// Drop everything (connection teardown).
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }
}

impl<I> Default for TypingCoordinator<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    fn default() -> Self {
        Self::new()
    }
}
