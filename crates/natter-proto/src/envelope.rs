//! The JSON frame envelope shared by chat and control traffic.
//!
//! Every frame on either subscription carries the same shape; the `type`
//! discriminator decides how the dispatcher routes it. Control frames (join,
//! leave, typing, receipts) omit the timestamp and status fields on the wire,
//! so those fields deserialize leniently.

use serde::{Deserialize, Serialize};

use crate::{
    body::MessageBody,
    errors::{ProtocolError, Result},
    identity::{PeerId, Timestamp},
};

/// Frame discriminator, serialized in the wire's uppercase convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameKind {
    /// Chat content (text, media reference, or an embedded delete signal).
    Chat,
    /// Peer came online.
    Join,
    /// Peer went offline.
    Leave,
    /// Peer is composing a message.
    Typing,
    /// Read receipt for a private conversation.
    Seen,
    /// Delivery receipt for a private conversation.
    Delivered,
}

impl FrameKind {
    /// The delivery status a receipt frame of this kind confers.
    /// `None` for non-receipt kinds.
    pub fn receipt_status(self) -> Option<DeliveryStatus> {
        match self {
            Self::Seen => Some(DeliveryStatus::Seen),
            Self::Delivered => Some(DeliveryStatus::Delivered),
            Self::Chat | Self::Join | Self::Leave | Self::Typing => None,
        }
    }
}

/// Per-message delivery state for private conversations.
///
/// Lifecycle: `Sent -> Delivered -> Seen`, driven by inbound receipt frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Transmitted, not yet confirmed by the peer.
    Sent,
    /// The peer's client received the message.
    Delivered,
    /// The peer viewed the conversation.
    Seen,
}

/// The two receipt kinds a client may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptKind {
    /// Message reached the peer's client off-screen.
    Delivered,
    /// Message was viewed in the focused conversation.
    Seen,
}

impl ReceiptKind {
    /// Frame discriminator for this receipt.
    pub fn frame_kind(self) -> FrameKind {
        match self {
            Self::Delivered => FrameKind::Delivered,
            Self::Seen => FrameKind::Seen,
        }
    }
}

/// Publish endpoint for an outbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The shared public-room broadcast endpoint.
    Broadcast,
    /// The per-recipient private endpoint.
    Direct(PeerId),
}

/// Subscription topic an inbound frame arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// The shared public topic all clients receive.
    Public,
    /// The user-scoped private topic.
    Private,
}

/// A broker frame.
///
/// Chat frames carry all fields; control frames omit `timestamp` (and often
/// `content` and `status`), which is why those fields are lenient on decode.
/// The `(sender, content, timestamp)` triple identifies a logical event for
/// deduplication and deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Authoring peer.
    pub sender: PeerId,

    /// Addressed peer; `None` for the public room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<PeerId>,

    /// Flat content string (see [`MessageBody`]). Empty on control frames.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,

    /// Frame discriminator.
    #[serde(rename = "type")]
    pub kind: FrameKind,

    /// Delivery state; chat frames start at `Sent`, control frames carry
    /// none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,

    /// Message identity; empty on control frames.
    #[serde(default, skip_serializing_if = "Timestamp::is_empty")]
    pub timestamp: Timestamp,
}

impl Envelope {
    /// Build a chat frame with optimistic `Sent` status.
    pub fn chat(
        sender: PeerId,
        receiver: Option<PeerId>,
        body: &MessageBody,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            sender,
            receiver,
            content: body.encode(),
            kind: FrameKind::Chat,
            status: Some(DeliveryStatus::Sent),
            timestamp,
        }
    }

    /// Build the join announcement emitted after connecting.
    pub fn join(sender: PeerId) -> Self {
        Self {
            sender,
            receiver: None,
            content: String::new(),
            kind: FrameKind::Join,
            status: None,
            timestamp: Timestamp::default(),
        }
    }

    /// Build a leave announcement.
    pub fn leave(sender: PeerId) -> Self {
        Self { kind: FrameKind::Leave, ..Self::join(sender) }
    }

    /// Build a typing indicator frame.
    pub fn typing(sender: PeerId, receiver: Option<PeerId>) -> Self {
        Self {
            sender,
            receiver,
            content: String::new(),
            kind: FrameKind::Typing,
            status: None,
            timestamp: Timestamp::default(),
        }
    }

    /// Build a zero-content receipt control frame.
    pub fn receipt(sender: PeerId, receiver: PeerId, kind: ReceiptKind) -> Self {
        Self {
            sender,
            receiver: Some(receiver),
            content: String::new(),
            kind: kind.frame_kind(),
            status: None,
            timestamp: Timestamp::default(),
        }
    }

    /// Build a delete signal addressed like the message it removes.
    pub fn delete(sender: PeerId, receiver: Option<PeerId>, target: Timestamp) -> Self {
        Self {
            sender,
            receiver,
            content: MessageBody::Delete { target }.encode(),
            kind: FrameKind::Chat,
            status: None,
            timestamp: Timestamp::default(),
        }
    }

    /// Typed view of the content string.
    pub fn body(&self) -> MessageBody {
        MessageBody::parse(&self.content)
    }

    /// Delivery state, defaulting absent wire fields to `Sent`.
    pub fn delivery_status(&self) -> DeliveryStatus {
        self.status.unwrap_or(DeliveryStatus::Sent)
    }

    /// True when both frames describe the same logical event.
    pub fn same_event(&self, other: &Self) -> bool {
        self.sender == other.sender
            && self.content == other.content
            && self.timestamp == other.timestamp
    }

    /// Encode to wire JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::JsonEncode(e.to_string()))
    }

    /// Decode from wire JSON.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| ProtocolError::JsonDecode(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn chat_frame_wire_shape() {
        let frame = Envelope::chat(
            PeerId::from("111"),
            Some(PeerId::from("222")),
            &MessageBody::Text("hi".to_string()),
            Timestamp::from("2024-03-09T12:30:45.000Z"),
        );

        let json = frame.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sender"], "111");
        assert_eq!(value["receiver"], "222");
        assert_eq!(value["content"], "hi");
        assert_eq!(value["type"], "CHAT");
        assert_eq!(value["status"], "SENT");
        assert_eq!(value["timestamp"], "2024-03-09T12:30:45.000Z");

        assert_eq!(Envelope::from_json(&json).unwrap(), frame);
    }

    #[test]
    fn join_frame_omits_optional_fields() {
        let json = Envelope::join(PeerId::from("111")).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "JOIN");
        assert!(value.get("receiver").is_none());
        assert!(value.get("content").is_none());
        assert!(value.get("status").is_none());
        assert!(value.get("timestamp").is_none());
    }

    #[test]
    fn bare_control_frame_decodes() {
        // The broker emits joins with only sender and type populated.
        let frame = Envelope::from_json(r#"{"sender":"333","type":"JOIN"}"#).unwrap();
        assert_eq!(frame.kind, FrameKind::Join);
        assert_eq!(frame.sender, PeerId::from("333"));
        assert!(frame.content.is_empty());
        assert!(frame.timestamp.is_empty());
        assert_eq!(frame.delivery_status(), DeliveryStatus::Sent);
    }

    #[test]
    fn receipt_carries_kind_not_content() {
        let frame = Envelope::receipt(PeerId::from("111"), PeerId::from("222"), ReceiptKind::Seen);
        assert_eq!(frame.kind, FrameKind::Seen);
        assert!(frame.content.is_empty());
        assert_eq!(frame.kind.receipt_status(), Some(DeliveryStatus::Seen));
    }

    #[test]
    fn delete_round_trips_target() {
        let target = Timestamp::from("2024-03-09T12:30:45.000Z");
        let frame = Envelope::delete(PeerId::from("111"), None, target.clone());
        match frame.body() {
            MessageBody::Delete { target: parsed } => assert_eq!(parsed, target),
            other => panic!("expected delete body, got {other:?}"),
        }
    }

    #[test]
    fn same_event_ignores_status() {
        let ts = Timestamp::from("2024-03-09T12:30:45.000Z");
        let a = Envelope::chat(
            PeerId::from("111"),
            None,
            &MessageBody::Text("hi".to_string()),
            ts.clone(),
        );
        let mut b = a.clone();
        b.status = Some(DeliveryStatus::Seen);
        assert!(a.same_event(&b));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            Envelope::from_json("{not json"),
            Err(ProtocolError::JsonDecode(_))
        ));
    }
}
