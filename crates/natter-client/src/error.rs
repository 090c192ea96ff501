//! Error types for the messaging engine.

use natter_proto::ProtocolError;
use thiserror::Error;

/// Errors the engine can surface to its caller.
///
/// The broker is a trusted collaborator, so a frame that fails to decode is
/// the one engine-fatal condition: it is propagated rather than swallowed
/// per-event. Everything else (sends while disconnected, unknown delete
/// targets, re-delivered frames) is absorbed as a no-op or an action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// An inbound frame failed to decode.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
