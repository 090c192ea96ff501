//! Broker connection lifecycle.
//!
//! One physical connection, owned explicitly rather than through hidden
//! module-level globals. The in-flight guard is the `Connecting` state
//! itself: `connect` is a no-op while an attempt is outstanding, and a
//! failure releases the guard without scheduling a retry — reconnection is
//! re-triggered lazily by the next send.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect  ┌────────────┐ established ┌───────────┐
//! │ Disconnected │─────────>│ Connecting │────────────>│ Connected │
//! └──────────────┘          └────────────┘             └───────────┘
//!        ↑                        │ failed                   │ closed
//!        │                        ↓                          │
//!        │                   ┌────────┐                      │
//!        └───── connect ─────│ Failed │    ←─────────────────┘
//!                            └────────┘      (closed lands on Disconnected)
//! ```

use natter_proto::{Channel, Envelope, PeerId};

use crate::event::ClientAction;

/// Connection lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// No connection and no attempt outstanding.
    Disconnected,
    /// Connect attempt in flight (the duplicate-socket guard).
    Connecting,
    /// Subscriptions registered, frames flowing.
    Connected,
    /// Last attempt failed; no retry scheduled.
    Failed {
        /// Failure description from the transport.
        reason: String,
    },
}

/// The single broker connection, as a pure state machine.
#[derive(Debug, Clone)]
pub struct Link {
    state: LinkState,
}

impl Link {
    /// Create a disconnected link.
    pub fn new() -> Self {
        Self { state: LinkState::Disconnected }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// True once subscriptions are registered.
    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Request a connection.
    ///
    /// No-op while an attempt is in flight or a connection is already
    /// established; exactly one attempt may be outstanding at a time.
    pub fn connect(&mut self) -> Vec<ClientAction> {
        match self.state {
            LinkState::Disconnected | LinkState::Failed { .. } => {
                self.state = LinkState::Connecting;
                vec![ClientAction::Connect]
            },
            LinkState::Connecting | LinkState::Connected => vec![],
        }
    }

    /// Transport reported an established connection.
    ///
    /// Registers exactly two subscriptions (the shared public topic and the
    /// user-scoped private topic) and announces presence with a JOIN frame.
    pub fn established(&mut self, local: &PeerId) -> Vec<ClientAction> {
        self.state = LinkState::Connected;
        vec![
            ClientAction::Subscribe(Channel::Public),
            ClientAction::Subscribe(Channel::Private),
            ClientAction::Publish {
                destination: natter_proto::Destination::Broadcast,
                envelope: Envelope::join(local.clone()),
            },
        ]
    }

    /// Transport reported a failed connect attempt.
    ///
    /// Releases the in-flight guard. The failure surfaces to the user only
    /// indirectly, through the notice emitted by the next failed send.
    pub fn failed(&mut self, reason: String) -> Vec<ClientAction> {
        tracing::warn!(reason, "broker connect failed");
        self.state = LinkState::Failed { reason };
        vec![]
    }

    /// Transport dropped the connection, or the caller tore it down.
    /// Safe to call when already disconnected.
    pub fn closed(&mut self) {
        self.state = LinkState::Disconnected;
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use natter_proto::FrameKind;

    use super::*;

    #[test]
    fn connect_is_guarded_while_in_flight() {
        let mut link = Link::new();
        assert_eq!(link.connect(), vec![ClientAction::Connect]);
        // Second call while pending: guard holds, no duplicate socket.
        assert_eq!(link.connect(), vec![]);
        assert_eq!(*link.state(), LinkState::Connecting);
    }

    #[test]
    fn connect_is_noop_when_connected() {
        let mut link = Link::new();
        link.connect();
        link.established(&PeerId::from("111"));
        assert_eq!(link.connect(), vec![]);
    }

    #[test]
    fn established_subscribes_twice_and_announces() {
        let mut link = Link::new();
        link.connect();
        let actions = link.established(&PeerId::from("111"));

        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0], ClientAction::Subscribe(Channel::Public));
        assert_eq!(actions[1], ClientAction::Subscribe(Channel::Private));
        match &actions[2] {
            ClientAction::Publish { envelope, .. } => {
                assert_eq!(envelope.kind, FrameKind::Join);
                assert_eq!(envelope.sender, PeerId::from("111"));
            },
            other => panic!("expected join publish, got {other:?}"),
        }
    }

    #[test]
    fn failure_releases_guard_without_retry() {
        let mut link = Link::new();
        link.connect();
        assert_eq!(link.failed("unreachable".to_string()), vec![]);
        assert_eq!(*link.state(), LinkState::Failed { reason: "unreachable".to_string() });

        // A fresh connect after failure starts a new attempt.
        assert_eq!(link.connect(), vec![ClientAction::Connect]);
    }

    #[test]
    fn closed_is_safe_when_already_disconnected() {
        let mut link = Link::new();
        link.closed();
        assert_eq!(*link.state(), LinkState::Disconnected);
    }
}
