//! Application layer for the Natter messaging engine.
//!
//! The engine in `natter-client` is Sans-IO; this crate supplies everything
//! around it: the broker transport, the history and attachment REST
//! collaborators, the persisted session store with its idle-expiry check,
//! and the tokio runtime driver that bridges them all.
//!
//! # Components
//!
//! - [`Runtime`]: the `select!` event loop executing engine actions
//! - [`BrokerTransport`] / [`MemoryBroker`]: the pub/sub wire
//! - [`HistoryApi`] / [`RestHistory`]: persisted conversation logs
//! - [`AttachmentStore`] / [`RestAttachments`]: out-of-band media storage
//! - [`Session`] / [`SessionStore`]: token, identity, contacts, expiry
//! - [`SystemEnv`]: production clock for the engine

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod env;
mod error;
mod history;
mod runtime;
mod session;
mod transport;
mod upload;

pub use env::SystemEnv;
pub use error::{HistoryError, RuntimeError, SessionError, TransportError, UploadError};
pub use history::{HistoryApi, RestHistory};
pub use runtime::{Runtime, RuntimeHandle, TICK_INTERVAL, UiCommand, UiEvent};
pub use session::{IDLE_EXPIRY_MILLIS, MemoryStore, Profile, Session, SessionStore};
pub use transport::{BrokerLink, BrokerTransport, LinkCommand, MemoryBroker};
pub use upload::{AttachmentStore, MAX_ATTACHMENT_BYTES, RestAttachments, body_for_upload};
