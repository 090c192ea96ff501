//! Routing identity and message identity.
//!
//! [`PeerId`] is the stable phone-number-like identity used to route private
//! frames and key contacts. [`Timestamp`] is the ISO-8601 string stamped on
//! every chat message; it is the sole identity used for deduplication and
//! deletion, so it is compared as an opaque string rather than as a parsed
//! instant.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Stable peer identity (phone-number-like string).
///
/// Construction trims surrounding whitespace: the wire occasionally carries
/// padded sender fields and identity comparison must not depend on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Create a peer id, trimming surrounding whitespace.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.len() == id.len() { Self(id) } else { Self(trimmed.to_string()) }
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PeerId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// ISO-8601 message timestamp, the sole identity of a chat message.
///
/// Two frames carrying equal `(sender, content, timestamp)` triples are the
/// same logical event. Control frames (join, typing, receipts) carry no
/// timestamp; those deserialize to [`Timestamp::default`], which is empty and
/// never enters a conversation log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Stamp from a wall-clock instant, millisecond precision with a `Z`
    /// suffix (the wire convention).
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// The raw wire string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the absent timestamp carried by control frames.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse back into a wall-clock instant. `None` for control-frame
    /// timestamps or foreign formats; identity comparison never needs this.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.0).ok().map(|dt| dt.with_timezone(&Utc))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Timestamp {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Timestamp {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
