//! Client state machine.
//!
//! The `Client` is the top-level state machine that reconciles broker traffic
//! into per-conversation logs and drives presence, typing, delivery and
//! contact state. It follows the Sans-IO action pattern: the caller feeds
//! [`ClientEvent`]s (frames, transport transitions, ticks, UI intents) and
//! executes the returned [`ClientAction`]s; the engine itself performs no
//! I/O and holds no timers beyond explicit deadlines.

use natter_proto::{
    Channel, Destination, Envelope, FrameKind, MessageBody, PeerId, ReceiptKind, Timestamp,
};

use crate::{
    config::EngineConfig,
    connection::{Link, LinkState},
    contacts::{Contact, ContactDirectory},
    delivery,
    env::Environment,
    error::ClientError,
    event::{ClientAction, ClientEvent, Notification},
    presence::Presence,
    store::{ConversationKey, ConversationStore},
    typing::TypingCoordinator,
};

/// Messaging engine for one local peer.
pub struct Client<E: Environment> {
    /// Environment for monotonic and wall-clock time.
    env: E,

    /// Timer constants and seeds.
    config: EngineConfig,

    /// Local peer identity.
    local: PeerId,

    /// The single broker connection.
    link: Link,

    /// Per-conversation message logs.
    store: ConversationStore,

    /// Currently-online peers.
    presence: Presence,

    /// Inbound typing indicators.
    typing: TypingCoordinator<E::Instant>,

    /// Durable peer → display name mapping.
    contacts: ContactDirectory,

    /// Conversation currently on screen.
    active: ConversationKey,

    /// Leading edge of the outbound typing throttle.
    last_typing_sent: Option<E::Instant>,
}

impl<E: Environment> Client<E> {
    /// Create an engine for the given local peer.
    pub fn new(env: E, local: PeerId, config: EngineConfig) -> Self {
        let contacts = ContactDirectory::seeded(config.assistant.clone());
        let store = ConversationStore::new(config.dedup_window);
        Self {
            env,
            config,
            local,
            link: Link::new(),
            store,
            presence: Presence::new(),
            typing: TypingCoordinator::new(),
            contacts,
            active: ConversationKey::Public,
            last_typing_sent: None,
        }
    }

    /// Process an event and return resulting actions.
    pub fn handle(
        &mut self,
        event: ClientEvent<E::Instant>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::ConnectRequested => Ok(self.link.connect()),
            ClientEvent::TransportConnected => Ok(self.link.established(&self.local)),
            ClientEvent::TransportFailed { reason } => Ok(self.link.failed(reason)),
            ClientEvent::TransportClosed => {
                self.teardown();
                Ok(vec![])
            },
            ClientEvent::FrameReceived { channel, frame } => {
                let envelope = Envelope::from_json(&frame)?;
                Ok(self.dispatch(channel, envelope))
            },
            ClientEvent::HistoryLoaded { peer, messages } => {
                // Wholesale replace; a stale fetch landing after navigation
                // still writes under its own key (tolerated, not guarded).
                self.store.replace_history(ConversationKey::Peer(peer), messages);
                Ok(vec![])
            },
            ClientEvent::Tick { now } => {
                self.typing.expire(now, self.config.typing_expiry);
                Ok(vec![])
            },
        }
    }

    // ---- inbound dispatch ------------------------------------------------

    fn dispatch(&mut self, channel: Channel, envelope: Envelope) -> Vec<ClientAction> {
        match envelope.kind {
            FrameKind::Join => {
                self.presence.mark_online(envelope.sender);
                vec![]
            },
            FrameKind::Leave => {
                self.presence.mark_offline(&envelope.sender);
                vec![]
            },
            FrameKind::Typing => {
                self.on_typing(channel, &envelope);
                vec![]
            },
            FrameKind::Seen | FrameKind::Delivered => {
                self.on_receipt(channel, &envelope);
                vec![]
            },
            FrameKind::Chat => self.on_chat(channel, envelope),
        }
    }

    fn on_typing(&mut self, channel: Channel, envelope: &Envelope) {
        if envelope.sender == self.local {
            return;
        }
        let key = Self::conversation_key(channel, &envelope.sender);
        let label = match channel {
            Channel::Public => {
                format!("{} is typing...", self.contacts.display_name(&envelope.sender))
            },
            Channel::Private => "typing...".to_string(),
        };
        self.typing.set(key, label, self.env.now());
    }

    fn on_receipt(&mut self, channel: Channel, envelope: &Envelope) {
        if channel == Channel::Public {
            tracing::debug!(sender = %envelope.sender, "receipt on public topic ignored");
            return;
        }
        let Some(status) = envelope.kind.receipt_status() else {
            return;
        };
        let key = ConversationKey::Peer(envelope.sender.clone());
        if let Some(log) = self.store.log_mut(&key) {
            let rewritten = delivery::apply_receipt(log, &self.local, status);
            tracing::debug!(sender = %envelope.sender, ?status, rewritten, "receipt applied");
        }
    }

    fn on_chat(&mut self, channel: Channel, envelope: Envelope) -> Vec<ClientAction> {
        let key = Self::conversation_key(channel, &envelope.sender);

        // Delete signals ride the CHAT kind and are processed even for our
        // own echoes: the local copy was already removed at send time, so
        // the repeat removal is a no-op.
        if let MessageBody::Delete { target } = envelope.body() {
            self.store.remove(&key, &target);
            return vec![];
        }

        if envelope.sender == self.local {
            // Locally originated messages were appended optimistically at
            // send time; the broker echo is already represented.
            tracing::debug!("dropped self-authored echo");
            return vec![];
        }

        if self.store.is_duplicate(&key, &envelope) {
            tracing::debug!(sender = %envelope.sender, "dropped re-delivered frame");
            return vec![];
        }

        let sender = envelope.sender.clone();
        let preview = envelope.body().preview();
        self.store.append(key.clone(), envelope);

        let mut actions = Vec::new();
        if channel == Channel::Private {
            if self.contacts.register(&sender) {
                actions.push(ClientAction::PersistContacts(self.contacts.snapshot()));
            }
            self.presence.mark_online(sender.clone());

            if self.active == key {
                actions.extend(self.receipt_action(sender, ReceiptKind::Seen));
            } else {
                let title = self.contacts.display_name(&sender).to_string();
                actions.extend(self.receipt_action(sender, ReceiptKind::Delivered));
                actions.push(ClientAction::Notify(Notification {
                    conversation: key,
                    title,
                    preview,
                }));
            }
        }
        actions
    }

    // ---- outbound composition --------------------------------------------

    /// Send chat content to the active conversation.
    ///
    /// Disconnected sends transmit nothing: the caller gets a transient
    /// notice and a lazy reconnect attempt, and the message is not queued.
    pub fn send_chat(&mut self, body: &MessageBody) -> Vec<ClientAction> {
        if !self.link.is_connected() {
            let mut actions = vec![ClientAction::Notice {
                message: "Connecting to server, message not sent".to_string(),
            }];
            actions.extend(self.link.connect());
            return actions;
        }

        let (receiver, destination) = self.active_route();
        let envelope =
            Envelope::chat(self.local.clone(), receiver, body, self.env.wall_clock());
        self.store.append(self.active.clone(), envelope.clone());
        vec![ClientAction::Publish { destination, envelope }]
    }

    /// Signal that the local user is typing in the active conversation.
    ///
    /// Leading-edge throttled: the first keystroke after a quiet period
    /// fires immediately, further keystrokes inside the window are
    /// suppressed. Silently skipped while disconnected.
    pub fn send_typing(&mut self) -> Vec<ClientAction> {
        if !self.link.is_connected() {
            return vec![];
        }
        let now = self.env.now();
        if let Some(last) = self.last_typing_sent
            && now - last < self.config.typing_throttle
        {
            return vec![];
        }
        self.last_typing_sent = Some(now);

        let (receiver, destination) = self.active_route();
        let envelope = Envelope::typing(self.local.clone(), receiver);
        vec![ClientAction::Publish { destination, envelope }]
    }

    /// Delete a message from the active conversation by timestamp.
    ///
    /// Removes locally first, then signals peers on the same destination the
    /// original message used.
    pub fn send_delete(&mut self, timestamp: &Timestamp) -> Vec<ClientAction> {
        self.store.remove(&self.active, timestamp);
        if !self.link.is_connected() {
            return vec![];
        }
        let (receiver, destination) = self.active_route();
        let envelope = Envelope::delete(self.local.clone(), receiver, timestamp.clone());
        vec![ClientAction::Publish { destination, envelope }]
    }

    /// Transmit a receipt control frame to a peer.
    /// Silently skipped while disconnected — no queuing, no retry.
    pub fn send_receipt(&mut self, peer: PeerId, kind: ReceiptKind) -> Vec<ClientAction> {
        self.receipt_action(peer, kind).into_iter().collect()
    }

    // ---- UI intents ------------------------------------------------------

    /// Request a broker connection.
    pub fn connect(&mut self) -> Vec<ClientAction> {
        self.link.connect()
    }

    /// Tear down the connection and clear session-scoped state.
    /// Safe to call when already disconnected.
    pub fn disconnect(&mut self) -> Vec<ClientAction> {
        self.teardown();
        vec![]
    }

    /// Switch the on-screen conversation.
    ///
    /// Private conversations trigger an asynchronous history fetch and, when
    /// connected, a SEEN receipt for the peer; the public room's log is
    /// session-only and never fetched.
    pub fn set_active(&mut self, key: ConversationKey) -> Vec<ClientAction> {
        self.active = key.clone();
        match key {
            ConversationKey::Public => vec![],
            ConversationKey::Peer(peer) => {
                let mut actions = vec![ClientAction::FetchHistory(peer.clone())];
                actions.extend(self.receipt_action(peer, ReceiptKind::Seen));
                actions
            },
        }
    }

    /// Empty a conversation log on explicit user action.
    pub fn clear_conversation(&mut self, key: &ConversationKey) {
        self.store.clear(key);
    }

    /// Save a contact with a display name.
    pub fn add_contact(&mut self, contact: Contact) -> Vec<ClientAction> {
        if self.contacts.insert(contact) {
            vec![ClientAction::PersistContacts(self.contacts.snapshot())]
        } else {
            vec![]
        }
    }

    /// Bulk phonebook-style contact import.
    pub fn import_contacts(&mut self, entries: Vec<Contact>) -> Vec<ClientAction> {
        if self.contacts.import(entries) > 0 {
            vec![ClientAction::PersistContacts(self.contacts.snapshot())]
        } else {
            vec![]
        }
    }

    // ---- accessors -------------------------------------------------------

    /// Local peer identity.
    pub fn local(&self) -> &PeerId {
        &self.local
    }

    /// Connection lifecycle state.
    pub fn link_state(&self) -> &LinkState {
        self.link.state()
    }

    /// Conversation currently on screen.
    pub fn active(&self) -> &ConversationKey {
        &self.active
    }

    /// Message log for a conversation, in append order.
    pub fn history(&self, key: &ConversationKey) -> &[Envelope] {
        self.store.history(key)
    }

    /// Whether a peer is currently online.
    pub fn is_online(&self, peer: &PeerId) -> bool {
        self.presence.is_online(peer)
    }

    /// Live typing indicator for a conversation, if any.
    pub fn typing_indicator(&self, key: &ConversationKey) -> Option<&str> {
        self.typing.indicator(key)
    }

    /// Display name for a peer, falling back to the bare id.
    pub fn display_name<'a>(&'a self, peer: &'a PeerId) -> &'a str {
        self.contacts.display_name(peer)
    }

    /// The contact directory.
    pub fn contacts(&self) -> &ContactDirectory {
        &self.contacts
    }

    // ---- internals -------------------------------------------------------

    fn conversation_key(channel: Channel, sender: &PeerId) -> ConversationKey {
        match channel {
            Channel::Public => ConversationKey::Public,
            Channel::Private => ConversationKey::Peer(sender.clone()),
        }
    }

    fn active_route(&self) -> (Option<PeerId>, Destination) {
        match &self.active {
            ConversationKey::Public => (None, Destination::Broadcast),
            ConversationKey::Peer(peer) => {
                (Some(peer.clone()), Destination::Direct(peer.clone()))
            },
        }
    }

    fn receipt_action(&self, peer: PeerId, kind: ReceiptKind) -> Option<ClientAction> {
        if !self.link.is_connected() {
            tracing::warn!(%peer, ?kind, "receipt skipped while disconnected");
            return None;
        }
        Some(ClientAction::Publish {
            destination: Destination::Direct(peer.clone()),
            envelope: Envelope::receipt(self.local.clone(), peer, kind),
        })
    }

    /// Clear every piece of connection-scoped singleton state.
    ///
    /// Presence is re-established by the join handshake on reconnect; the
    /// public-room log is session-only; typing deadlines are cancelled so
    /// nothing fires against a torn-down connection. Private logs stay — the
    /// history fetch replaces them on next focus.
    fn teardown(&mut self) {
        self.link.closed();
        self.presence.clear();
        self.typing.clear_all();
        self.last_typing_sent = None;
        self.store.clear(&ConversationKey::Public);
    }
}
