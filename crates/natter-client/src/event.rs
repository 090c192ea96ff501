//! Client events and actions.

use natter_proto::{Channel, Destination, Envelope, PeerId};

use crate::{contacts::Contact, store::ConversationKey};

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Receiving raw frames from the broker subscriptions
/// - Driving time forward via ticks
/// - Reporting transport lifecycle transitions
/// - Feeding back history fetch results
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and virtual-clock test environments.
#[derive(Debug, Clone)]
pub enum ClientEvent<I = std::time::Instant> {
    /// Caller wants a broker connection established.
    ConnectRequested,

    /// Transport finished connecting.
    TransportConnected,

    /// Transport failed to connect; the in-flight guard is released and no
    /// retry is scheduled.
    TransportFailed {
        /// Failure description from the transport.
        reason: String,
    },

    /// Transport dropped an established connection.
    TransportClosed,

    /// Raw frame received on a broker subscription.
    FrameReceived {
        /// Topic the frame arrived on.
        channel: Channel,
        /// JSON frame text, undecoded.
        frame: String,
    },

    /// Conversation history fetched from the external store.
    HistoryLoaded {
        /// Conversation peer the history belongs to.
        peer: PeerId,
        /// Full replacement log, in server order.
        messages: Vec<Envelope>,
    },

    /// Time tick for timer processing.
    ///
    /// The caller should send ticks periodically so the client can expire
    /// inbound typing indicators.
    Tick {
        /// Current time from the environment.
        now: I,
    },
}

/// Off-screen notification signal for an inbound private message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Conversation the message landed in.
    pub conversation: ConversationKey,
    /// Display name of the sender.
    pub title: String,
    /// Short human form of the message content.
    pub preview: String,
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Open the broker connection.
    Connect,

    /// Register a broker subscription after connecting.
    Subscribe(Channel),

    /// Publish a frame to a broker destination.
    Publish {
        /// Endpoint to publish on.
        destination: Destination,
        /// Frame to send.
        envelope: Envelope,
    },

    /// Fetch conversation history for a peer from the external store.
    ///
    /// The caller feeds the result back as
    /// [`ClientEvent::HistoryLoaded`]; a failed fetch is logged and
    /// dropped, leaving the current log untouched.
    FetchHistory(PeerId),

    /// Fire an off-screen notification.
    Notify(Notification),

    /// Show a transient user-visible notice.
    Notice {
        /// Notice text.
        message: String,
    },

    /// Persist the contact directory snapshot.
    ///
    /// The caller decides the storage backend.
    PersistContacts(Vec<Contact>),
}
