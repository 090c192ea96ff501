//! Engine configuration.

use std::time::Duration;

use natter_proto::PeerId;

use crate::contacts::Contact;

/// Quiet period after which an inbound typing indicator clears itself.
pub const DEFAULT_TYPING_EXPIRY: Duration = Duration::from_millis(2000);

/// Minimum gap between outbound typing frames (leading-edge throttle).
pub const DEFAULT_TYPING_THROTTLE: Duration = Duration::from_millis(1500);

/// Trailing log entries inspected when deduplicating re-delivered frames.
pub const DEFAULT_DEDUP_WINDOW: usize = 5;

/// Engine configuration.
///
/// Timer constants and the pre-seeded assistant contact. The assistant is a
/// contact-list seed only; its online state follows the same JOIN/LEAVE
/// protocol as any peer.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Inbound typing indicator lifetime without a refresh.
    pub typing_expiry: Duration,
    /// Outbound typing throttle window.
    pub typing_throttle: Duration,
    /// Trailing dedup window size.
    pub dedup_window: usize,
    /// Contact seeded into every fresh directory.
    pub assistant: Contact,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            typing_expiry: DEFAULT_TYPING_EXPIRY,
            typing_throttle: DEFAULT_TYPING_THROTTLE,
            dedup_window: DEFAULT_DEDUP_WINDOW,
            assistant: Contact {
                id: PeerId::from("natter-assistant"),
                name: "Natter Assistant".to_string(),
            },
        }
    }
}
