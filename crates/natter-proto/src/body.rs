//! Typed view over the flat content-string convention.
//!
//! Chat content travels as one string field. Media references are tagged with
//! an uppercase prefix (`IMAGE::url`, `FILE::name::url`, `AUDIO::url`,
//! `LOCATION::url`) and deletion signals as `DELETE::timestamp`; anything
//! else is plain text. [`MessageBody`] makes the tagging explicit while
//! [`MessageBody::encode`] / [`MessageBody::parse`] keep the wire flat for
//! interop with existing peers.
//!
//! # Invariants
//!
//! - `parse(encode(body)) == body` for every constructible body. File names
//!   must not contain `::` (the segment separator); the url half may, because
//!   the name/url split takes the first separator only.
//! - Unknown prefixes degrade to [`MessageBody::Text`], never to an error.

use crate::identity::Timestamp;

const IMAGE_PREFIX: &str = "IMAGE::";
const FILE_PREFIX: &str = "FILE::";
const AUDIO_PREFIX: &str = "AUDIO::";
const LOCATION_PREFIX: &str = "LOCATION::";
const DELETE_PREFIX: &str = "DELETE::";

/// Message content, decoded from the wire's flat string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Plain text.
    Text(String),

    /// Image attachment by url.
    Image {
        /// Location of the uploaded image.
        url: String,
    },

    /// Generic document attachment.
    File {
        /// Original file name shown to the receiver.
        name: String,
        /// Location of the uploaded file.
        url: String,
    },

    /// Voice message by url.
    Audio {
        /// Location of the uploaded recording.
        url: String,
    },

    /// Shared map location by url.
    Location {
        /// Maps link for the shared position.
        url: String,
    },

    /// Control signal: remove the message stamped `target` from the log.
    Delete {
        /// Timestamp identity of the message to remove.
        target: Timestamp,
    },
}

impl MessageBody {
    /// Decode a content string. Infallible: unrecognized shapes are text.
    pub fn parse(content: &str) -> Self {
        if let Some(url) = content.strip_prefix(IMAGE_PREFIX) {
            return Self::Image { url: url.to_string() };
        }
        if let Some(rest) = content.strip_prefix(FILE_PREFIX) {
            // FILE carries an extra name segment: FILE::name::url
            if let Some((name, url)) = rest.split_once("::") {
                return Self::File { name: name.to_string(), url: url.to_string() };
            }
            return Self::Text(content.to_string());
        }
        if let Some(url) = content.strip_prefix(AUDIO_PREFIX) {
            return Self::Audio { url: url.to_string() };
        }
        if let Some(url) = content.strip_prefix(LOCATION_PREFIX) {
            return Self::Location { url: url.to_string() };
        }
        if let Some(target) = content.strip_prefix(DELETE_PREFIX) {
            return Self::Delete { target: Timestamp::from(target) };
        }
        Self::Text(content.to_string())
    }

    /// Encode to the wire's flat string.
    pub fn encode(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Image { url } => format!("{IMAGE_PREFIX}{url}"),
            Self::File { name, url } => format!("{FILE_PREFIX}{name}::{url}"),
            Self::Audio { url } => format!("{AUDIO_PREFIX}{url}"),
            Self::Location { url } => format!("{LOCATION_PREFIX}{url}"),
            Self::Delete { target } => format!("{DELETE_PREFIX}{target}"),
        }
    }

    /// Short human form for notification previews.
    pub fn preview(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Image { .. } => "Photo".to_string(),
            Self::File { name, .. } => format!("Document: {name}"),
            Self::Audio { .. } => "Voice message".to_string(),
            Self::Location { .. } => "Shared a location".to_string(),
            Self::Delete { .. } => "Deleted a message".to_string(),
        }
    }
}
