//! Runtime driver for the messaging engine.
//!
//! Single-threaded, event-driven orchestration (one `tokio::select!` loop):
//! inbound broker frames, UI commands, history fetch results, and a periodic
//! tick all feed the Sans-IO engine, and the returned actions are executed
//! against the collaborators. Suspension points are solely the asynchronous
//! I/O boundaries — opening the connection, fetching history, uploading
//! attachments. No automatic retry exists anywhere; every retry is
//! re-triggered by the next user action.

use std::time::Duration;

use natter_client::{
    Client, ClientAction, ClientError, ClientEvent, Contact, ConversationKey, EngineConfig,
    Environment, Notification,
};
use natter_proto::{Channel, MessageBody, PeerId, Timestamp};
use tokio::sync::mpsc;

use crate::{
    error::{HistoryError, RuntimeError},
    history::HistoryApi,
    session::{Session, SessionStore},
    transport::{BrokerLink, BrokerTransport, LinkCommand},
    upload::{AttachmentStore, MAX_ATTACHMENT_BYTES, body_for_upload},
};

/// Cadence of the engine's timer tick.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Commands the embedding UI sends into the runtime.
#[derive(Debug, Clone)]
pub enum UiCommand {
    /// Open the broker connection.
    Connect,
    /// Tear the connection down, clearing session-scoped engine state.
    Disconnect,
    /// Send a text message to the active conversation.
    SendText(String),
    /// Share a map location in the active conversation.
    ShareLocation {
        /// Maps link for the position.
        url: String,
    },
    /// Upload an attachment and send its reference.
    SendAttachment {
        /// Original file name.
        name: String,
        /// Media type, used to pick the body tag.
        mime: String,
        /// Raw attachment bytes.
        bytes: Vec<u8>,
    },
    /// Signal that the local user is typing.
    SendTyping,
    /// Delete a message by timestamp from the active conversation.
    DeleteMessage(Timestamp),
    /// Switch the on-screen conversation.
    SetActive(ConversationKey),
    /// Empty a conversation log.
    ClearConversation(ConversationKey),
    /// Save a contact.
    AddContact(Contact),
    /// Bulk phonebook-style import.
    ImportContacts(Vec<Contact>),
    /// Stop the runtime.
    Quit,
}

/// Signals the runtime surfaces to the embedding UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Transient user-visible notice (failed send, failed upload).
    Notice(String),
    /// Off-screen notification for an inbound private message.
    Notification(Notification),
}

/// Channel pair the embedding UI keeps.
pub struct RuntimeHandle {
    /// Commands into the runtime.
    pub commands: mpsc::Sender<UiCommand>,
    /// Notices and notifications out of the runtime.
    pub events: mpsc::Receiver<UiEvent>,
}

type HistoryResult = (PeerId, Result<Vec<natter_proto::Envelope>, HistoryError>);

/// Orchestrates the engine and its external collaborators.
pub struct Runtime<E, B, H, A, S>
where
    E: Environment,
{
    env: E,
    client: Client<E>,
    transport: B,
    history: H,
    attachments: A,
    session: Session<S>,
    commands: mpsc::Receiver<UiCommand>,
    events: mpsc::Sender<UiEvent>,
    link: Option<BrokerLink>,
    history_tx: mpsc::Sender<HistoryResult>,
    history_rx: mpsc::Receiver<HistoryResult>,
}

impl<E, B, H, A, S> Runtime<E, B, H, A, S>
where
    E: Environment,
    B: BrokerTransport,
    H: HistoryApi,
    A: AttachmentStore,
    S: SessionStore,
{
    /// Create a runtime and the handle the embedding UI keeps.
    ///
    /// Saved contacts are loaded into the engine's directory up front.
    pub fn new(
        env: E,
        local: PeerId,
        config: EngineConfig,
        transport: B,
        history: H,
        attachments: A,
        session: Session<S>,
    ) -> (Self, RuntimeHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(32);
        let (history_tx, history_rx) = mpsc::channel(8);

        let mut client = Client::new(env.clone(), local, config);
        let saved = session.contacts();
        if !saved.is_empty() {
            let _ = client.import_contacts(saved);
        }

        let runtime = Self {
            env,
            client,
            transport,
            history,
            attachments,
            session,
            commands: command_rx,
            events: event_tx,
            link: None,
            history_tx,
            history_rx,
        };
        (runtime, RuntimeHandle { commands: command_tx, events: event_rx })
    }

    /// The engine, for rendering state.
    pub fn client(&self) -> &Client<E> {
        &self.client
    }

    /// Run the event loop until `Quit` or the command channel closes.
    pub async fn run(mut self) -> Result<(), RuntimeError> {
        let mut tick = tokio::time::interval(TICK_INTERVAL);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        None | Some(UiCommand::Quit) => break,
                        Some(command) => self.on_command(command).await?,
                    }
                },
                inbound = Self::recv_from(self.link.as_mut()) => {
                    match inbound {
                        Some((channel, frame)) => {
                            let actions = self
                                .client
                                .handle(ClientEvent::FrameReceived { channel, frame })?;
                            self.execute(actions).await?;
                        },
                        None => {
                            // Transport dropped the connection.
                            if let Some(link) = self.link.take() {
                                link.stop();
                            }
                            let actions = self.client.handle(ClientEvent::TransportClosed)?;
                            self.execute(actions).await?;
                        },
                    }
                },
                Some((peer, result)) = self.history_rx.recv() => {
                    match result {
                        Ok(messages) => {
                            let actions = self
                                .client
                                .handle(ClientEvent::HistoryLoaded { peer, messages })?;
                            self.execute(actions).await?;
                        },
                        Err(e) => {
                            // Never surfaced: the conversation keeps the log
                            // it already had.
                            tracing::warn!(%peer, error = %e, "history fetch failed");
                        },
                    }
                },
                _ = tick.tick() => {
                    let actions = self.client.handle(ClientEvent::Tick { now: self.env.now() })?;
                    self.execute(actions).await?;
                },
            }
        }

        if let Some(link) = self.link.take() {
            link.stop();
        }
        Ok(())
    }

    async fn recv_from(link: Option<&mut BrokerLink>) -> Option<(Channel, String)> {
        match link {
            Some(link) => link.from_broker.recv().await,
            None => std::future::pending().await,
        }
    }

    async fn on_command(&mut self, command: UiCommand) -> Result<(), RuntimeError> {
        let actions = match command {
            UiCommand::Connect => self.client.connect(),
            UiCommand::Disconnect => {
                if let Some(link) = self.link.take() {
                    link.stop();
                }
                self.client.disconnect()
            },
            UiCommand::SendText(text) => self.client.send_chat(&MessageBody::Text(text)),
            UiCommand::ShareLocation { url } => {
                self.client.send_chat(&MessageBody::Location { url })
            },
            UiCommand::SendAttachment { name, mime, bytes } => {
                return self.on_attachment(name, mime, bytes).await;
            },
            UiCommand::SendTyping => self.client.send_typing(),
            UiCommand::DeleteMessage(timestamp) => self.client.send_delete(&timestamp),
            UiCommand::SetActive(key) => self.client.set_active(key),
            UiCommand::ClearConversation(key) => {
                self.client.clear_conversation(&key);
                vec![]
            },
            UiCommand::AddContact(contact) => self.client.add_contact(contact),
            UiCommand::ImportContacts(entries) => self.client.import_contacts(entries),
            UiCommand::Quit => vec![], // handled by the loop
        };
        self.execute(actions).await
    }

    async fn on_attachment(
        &mut self,
        name: String,
        mime: String,
        bytes: Vec<u8>,
    ) -> Result<(), RuntimeError> {
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            self.notify_ui(UiEvent::Notice("File size must be less than 20 MB".to_string()))
                .await;
            return Ok(());
        }
        match self.attachments.upload(&name, &mime, bytes).await {
            Ok(url) => {
                let body = body_for_upload(&name, &mime, url);
                let actions = self.client.send_chat(&body);
                self.execute(actions).await
            },
            Err(e) => {
                tracing::warn!(error = %e, "attachment upload failed");
                self.notify_ui(UiEvent::Notice("Upload failed".to_string())).await;
                Ok(())
            },
        }
    }

    /// Execute actions, feeding any follow-up actions back into the queue
    /// until it drains.
    async fn execute(&mut self, initial: Vec<ClientAction>) -> Result<(), RuntimeError> {
        let mut pending = initial;
        while !pending.is_empty() {
            let actions = std::mem::take(&mut pending);
            for action in actions {
                match action {
                    ClientAction::Connect => pending.extend(self.open_link().await?),
                    ClientAction::Subscribe(channel) => {
                        self.send_link(LinkCommand::Subscribe(channel)).await;
                    },
                    ClientAction::Publish { destination, envelope } => {
                        let frame = envelope.to_json().map_err(ClientError::from)?;
                        self.send_link(LinkCommand::Publish { destination, frame }).await;
                    },
                    ClientAction::FetchHistory(peer) => self.spawn_history_fetch(peer),
                    ClientAction::Notify(notification) => {
                        self.notify_ui(UiEvent::Notification(notification)).await;
                    },
                    ClientAction::Notice { message } => {
                        self.notify_ui(UiEvent::Notice(message)).await;
                    },
                    ClientAction::PersistContacts(contacts) => {
                        self.session.save_contacts(&contacts);
                    },
                }
            }
        }
        Ok(())
    }

    async fn open_link(&mut self) -> Result<Vec<ClientAction>, RuntimeError> {
        match self.transport.connect(self.client.local()).await {
            Ok(link) => {
                self.link = Some(link);
                Ok(self.client.handle(ClientEvent::TransportConnected)?)
            },
            Err(e) => Ok(self.client.handle(ClientEvent::TransportFailed {
                reason: e.to_string(),
            })?),
        }
    }

    async fn send_link(&mut self, command: LinkCommand) {
        let Some(link) = &self.link else {
            tracing::warn!("no broker link; dropping outbound frame");
            return;
        };
        if link.to_broker.send(command).await.is_err() {
            tracing::warn!("broker link closed while sending");
        }
    }

    fn spawn_history_fetch(&self, peer: PeerId) {
        let api = self.history.clone();
        let local = self.client.local().clone();
        let results = self.history_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch(&local, &peer).await;
            let _ = results.send((peer, result)).await;
        });
    }

    async fn notify_ui(&self, event: UiEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("ui event channel closed");
        }
    }
}
