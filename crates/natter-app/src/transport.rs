//! Broker transport abstraction.
//!
//! Provides [`BrokerLink`], a channel pair over one physical broker
//! connection. This is a thin layer that just moves frames — connection
//! lifecycle and all protocol logic remain in the Sans-IO engine.
//!
//! [`MemoryBroker`] is the in-process implementation backing runtime tests:
//! it routes published frames between registered peers exactly the way the
//! real relay does, including echoing broadcast frames back to their sender.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
};

use natter_proto::{Channel, Destination, PeerId};
use tokio::{sync::mpsc, task::AbortHandle};

use crate::error::TransportError;

/// Requests the runtime sends down an open link.
#[derive(Debug, Clone)]
pub enum LinkCommand {
    /// Register one of the two subscriptions.
    Subscribe(Channel),

    /// Publish an encoded frame to a broker destination.
    Publish {
        /// Endpoint to publish on.
        destination: Destination,
        /// JSON frame text.
        frame: String,
    },
}

/// Handle to one connected broker session.
///
/// Frames move through the channels; an internal task owns the actual I/O.
pub struct BrokerLink {
    /// Send subscriptions and publishes to the broker.
    pub to_broker: mpsc::Sender<LinkCommand>,
    /// Receive `(topic, frame)` pairs from the broker.
    pub from_broker: mpsc::Receiver<(Channel, String)>,
    /// Abort handle to stop the connection task.
    abort_handle: AbortHandle,
}

impl BrokerLink {
    /// Assemble a link from its parts.
    pub fn new(
        to_broker: mpsc::Sender<LinkCommand>,
        from_broker: mpsc::Receiver<(Channel, String)>,
        abort_handle: AbortHandle,
    ) -> Self {
        Self { to_broker, from_broker, abort_handle }
    }

    /// Stop the connection task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Connects physical broker sessions.
///
/// Implementations own the wire (STOMP, WebSocket, in-process loopback);
/// the runtime only sees the [`BrokerLink`] channel pair.
pub trait BrokerTransport: Send {
    /// Open a connection for the local peer.
    fn connect(
        &self,
        local: &PeerId,
    ) -> impl Future<Output = Result<BrokerLink, TransportError>> + Send;
}

#[derive(Debug)]
struct RegisteredPeer {
    inbound: mpsc::Sender<(Channel, String)>,
    public: bool,
    private: bool,
}

/// In-process broker for tests and simulation.
///
/// Broadcast frames fan out to every peer subscribed to the public topic —
/// including the sender, which is exactly why the engine drops self-authored
/// echoes. Direct frames reach the addressee's private topic only.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    peers: Arc<Mutex<HashMap<PeerId, RegisteredPeer>>>,
}

impl MemoryBroker {
    /// Create an empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn route(&self, sender: &PeerId, command: LinkCommand) -> Vec<mpsc::Sender<(Channel, String)>> {
        let mut peers = self.peers.lock().expect("Mutex poisoned");
        match command {
            LinkCommand::Subscribe(channel) => {
                if let Some(peer) = peers.get_mut(sender) {
                    match channel {
                        Channel::Public => peer.public = true,
                        Channel::Private => peer.private = true,
                    }
                }
                vec![]
            },
            LinkCommand::Publish { destination, .. } => match destination {
                Destination::Broadcast => {
                    peers.values().filter(|p| p.public).map(|p| p.inbound.clone()).collect()
                },
                Destination::Direct(target) => peers
                    .get(&target)
                    .filter(|p| p.private)
                    .map(|p| p.inbound.clone())
                    .into_iter()
                    .collect(),
            },
        }
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn unregister(&self, peer: &PeerId) {
        self.peers.lock().expect("Mutex poisoned").remove(peer);
    }
}

impl BrokerTransport for MemoryBroker {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    async fn connect(&self, local: &PeerId) -> Result<BrokerLink, TransportError> {
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<LinkCommand>(32);
        let (in_tx, in_rx) = mpsc::channel::<(Channel, String)>(32);

        self.peers
            .lock()
            .expect("Mutex poisoned")
            .insert(local.clone(), RegisteredPeer { inbound: in_tx, public: false, private: false });

        let broker = self.clone();
        let peer = local.clone();
        let handle = tokio::spawn(async move {
            while let Some(command) = cmd_rx.recv().await {
                let channel = match &command {
                    LinkCommand::Publish { destination: Destination::Broadcast, .. } => {
                        Channel::Public
                    },
                    _ => Channel::Private,
                };
                let frame = match &command {
                    LinkCommand::Publish { frame, .. } => Some(frame.clone()),
                    LinkCommand::Subscribe(_) => None,
                };
                // Collect targets under the lock, deliver after releasing it.
                let targets = broker.route(&peer, command);
                if let Some(frame) = frame {
                    for target in targets {
                        let _ = target.send((channel, frame.clone())).await;
                    }
                }
            }
            broker.unregister(&peer);
        });

        Ok(BrokerLink::new(cmd_tx, in_rx, handle.abort_handle()))
    }
}
