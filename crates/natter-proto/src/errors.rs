//! Error types for wire encoding and decoding.
//!
//! Strongly-typed errors instead of bare `serde_json::Error` so callers can
//! match on failure classes without depending on the codec crate.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire frames.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// JSON serialization failed.
    #[error("json encode failed: {0}")]
    JsonEncode(String),

    /// JSON deserialization failed.
    #[error("json decode failed: {0}")]
    JsonDecode(String),

    /// A frame field violated a structural requirement.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
