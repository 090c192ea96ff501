//! Wire model for the Natter broker protocol.
//!
//! Frames on the wire are JSON-encoded text sharing one envelope shape for
//! chat content and control signals (join/leave, typing, receipts),
//! distinguished by the `type` discriminator. Message content uses a flat
//! `PREFIX::payload` string convention for media; [`MessageBody`] is the
//! typed view over that convention.
//!
//! # Components
//!
//! - [`Envelope`]: the JSON frame shared by chat and control traffic
//! - [`MessageBody`]: tagged union over the flat content-string convention
//! - [`PeerId`] / [`Timestamp`]: routing identity and message identity
//! - [`Destination`] / [`Channel`]: the two publish endpoints and the two
//!   subscription topics

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod body;
mod envelope;
mod errors;
mod identity;

pub use body::MessageBody;
pub use envelope::{Channel, DeliveryStatus, Destination, Envelope, FrameKind, ReceiptKind};
pub use errors::{ProtocolError, Result};
pub use identity::{PeerId, Timestamp};
