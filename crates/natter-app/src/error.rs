//! Error types for the application layer.
//!
//! One enum per external collaborator. Every failure is recovered at the
//! boundary where it is detected — none crash the runtime, and no automatic
//! retry exists anywhere; a retry is always re-triggered by the next user
//! action.

use natter_client::ClientError;
use thiserror::Error;

/// Broker transport failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The link's channel to the broker task closed.
    #[error("link closed")]
    Closed,
}

/// History API failures. Logged, never surfaced: the conversation silently
/// keeps whatever log it already had.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Request failed or the server answered non-2xx.
    #[error("history request failed: {0}")]
    Request(String),

    /// Response body did not decode as a message array.
    #[error("unexpected history payload: {0}")]
    Payload(String),
}

/// Attachment upload failures. Surfaced as a user-visible notice, no retry.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Attachment exceeds the upload size cap.
    #[error("attachment of {size} bytes exceeds the {max} byte cap")]
    TooLarge {
        /// Attachment size.
        size: usize,
        /// Configured cap.
        max: usize,
    },

    /// Request failed or the server answered non-2xx.
    #[error("upload request failed: {0}")]
    Request(String),

    /// Response body did not carry an upload url.
    #[error("unexpected upload payload: {0}")]
    Payload(String),
}

/// Persisted-session failures. Both force a fresh authentication.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No stored credentials.
    #[error("no stored credentials")]
    Unauthenticated,

    /// Idle longer than the expiry window; local state has been cleared.
    #[error("session expired after idle timeout")]
    Expired,
}

/// Runtime driver failures.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The engine rejected an event (malformed frame from the broker).
    #[error("engine error: {0}")]
    Engine(#[from] ClientError),
}
