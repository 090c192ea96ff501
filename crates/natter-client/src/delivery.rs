//! Delivery state transitions for private conversations.
//!
//! A receipt from the peer rewrites the status of every message in that
//! conversation authored by the local peer. Transitions are last-write-wins:
//! the wire protocol does not order receipts, so a DELIVERED arriving after a
//! SEEN overwrites it, matching what every deployed peer observes.
//! Public-room messages never carry delivery state.

use natter_proto::{DeliveryStatus, Envelope, PeerId};

/// Apply a receipt to a private conversation log.
///
/// Rewrites the status of each message authored by `local`; messages from
/// the peer are untouched. Returns how many entries were rewritten.
pub fn apply_receipt(log: &mut [Envelope], local: &PeerId, status: DeliveryStatus) -> usize {
    let mut rewritten = 0;
    for message in log.iter_mut().filter(|m| m.sender == *local) {
        message.status = Some(status);
        rewritten += 1;
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use natter_proto::{MessageBody, Timestamp};

    use super::*;

    fn chat(sender: &str, receiver: &str, ts: &str) -> Envelope {
        Envelope::chat(
            PeerId::from(sender),
            Some(PeerId::from(receiver)),
            &MessageBody::Text("hi".to_string()),
            Timestamp::from(ts),
        )
    }

    #[test]
    fn receipt_rewrites_only_local_authored_messages() {
        let local = PeerId::from("111");
        let mut log = vec![
            chat("111", "222", "2024-01-01T00:00:01.000Z"),
            chat("222", "111", "2024-01-01T00:00:02.000Z"),
            chat("111", "222", "2024-01-01T00:00:03.000Z"),
        ];

        let rewritten = apply_receipt(&mut log, &local, DeliveryStatus::Seen);
        assert_eq!(rewritten, 2);
        assert_eq!(log[0].status, Some(DeliveryStatus::Seen));
        assert_eq!(log[1].status, Some(DeliveryStatus::Sent));
        assert_eq!(log[2].status, Some(DeliveryStatus::Seen));
    }

    #[test]
    fn later_receipt_overwrites_regardless_of_order() {
        let local = PeerId::from("111");
        let mut log = vec![chat("111", "222", "2024-01-01T00:00:01.000Z")];

        apply_receipt(&mut log, &local, DeliveryStatus::Seen);
        // Last write wins: a late DELIVERED downgrades the SEEN.
        apply_receipt(&mut log, &local, DeliveryStatus::Delivered);
        assert_eq!(log[0].status, Some(DeliveryStatus::Delivered));
    }
}
