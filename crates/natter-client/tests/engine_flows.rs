//! End-to-end engine flows over the public API.
//!
//! Each test drives a `Client` the way the runtime does — transport
//! transitions, raw JSON frames, ticks — and asserts on the returned actions
//! and observable state, covering the engine's externally promised behavior:
//! presence algebra, delete-by-timestamp, re-delivery dedup, typing expiry
//! and throttling, receipt synthesis, and wholesale history replacement.

use std::time::Duration;

use natter_client::{
    Client, ClientAction, ClientEvent, ConversationKey, EngineConfig, env::test_utils::MockEnv,
};
use natter_proto::{
    Channel, DeliveryStatus, Destination, Envelope, FrameKind, MessageBody, PeerId, Timestamp,
};

const LOCAL: &str = "111";
const PEER_B: &str = "222";
const PEER_C: &str = "333";

fn client(env: &MockEnv) -> Client<MockEnv> {
    let mut client = Client::new(env.clone(), PeerId::from(LOCAL), EngineConfig::default());
    client.handle(ClientEvent::ConnectRequested).expect("connect request");
    client.handle(ClientEvent::TransportConnected).expect("transport connected");
    client
}

fn deliver(client: &mut Client<MockEnv>, channel: Channel, envelope: &Envelope) -> Vec<ClientAction> {
    let frame = envelope.to_json().expect("encode frame");
    client.handle(ClientEvent::FrameReceived { channel, frame }).expect("dispatch frame")
}

fn tick(client: &mut Client<MockEnv>, env: &MockEnv) {
    let now = natter_client::Environment::now(env);
    client.handle(ClientEvent::Tick { now }).expect("tick");
}

fn publishes(actions: &[ClientAction]) -> Vec<(Destination, Envelope)> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::Publish { destination, envelope } => {
                Some((destination.clone(), envelope.clone()))
            },
            _ => None,
        })
        .collect()
}

fn chat_from(sender: &str, receiver: Option<&str>, text: &str, ts: &str) -> Envelope {
    Envelope::chat(
        PeerId::from(sender),
        receiver.map(PeerId::from),
        &MessageBody::Text(text.to_string()),
        Timestamp::from(ts),
    )
}

#[test]
fn presence_excludes_peer_after_join_then_leave() {
    let env = MockEnv::new();
    let mut client = client(&env);

    deliver(&mut client, Channel::Public, &Envelope::join(PeerId::from(PEER_B)));
    assert!(client.is_online(&PeerId::from(PEER_B)));

    deliver(&mut client, Channel::Public, &Envelope::leave(PeerId::from(PEER_B)));
    assert!(!client.is_online(&PeerId::from(PEER_B)));

    // LEAVE before any JOIN is a no-op removal.
    deliver(&mut client, Channel::Public, &Envelope::leave(PeerId::from(PEER_C)));
    assert!(!client.is_online(&PeerId::from(PEER_C)));
}

#[test]
fn delete_signal_removes_exactly_the_matching_message() {
    let env = MockEnv::new();
    let mut client = client(&env);

    let kept = chat_from(PEER_B, None, "keep me", "2024-01-01T00:00:01.000Z");
    let doomed = chat_from(PEER_B, None, "delete me", "2024-01-01T00:00:02.000Z");
    deliver(&mut client, Channel::Public, &kept);
    deliver(&mut client, Channel::Public, &doomed);

    let delete =
        Envelope::delete(PeerId::from(PEER_B), None, Timestamp::from("2024-01-01T00:00:02.000Z"));
    deliver(&mut client, Channel::Public, &delete);

    let log = client.history(&ConversationKey::Public);
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].content, "keep me");

    // Deleting a timestamp that matches nothing changes nothing.
    let stray =
        Envelope::delete(PeerId::from(PEER_B), None, Timestamp::from("2024-01-01T00:00:09.000Z"));
    deliver(&mut client, Channel::Public, &stray);
    assert_eq!(client.history(&ConversationKey::Public).len(), 1);
}

#[test]
fn sender_delete_removes_optimistic_copy_and_signals_same_destination() {
    let env = MockEnv::new();
    let mut client = client(&env);
    client.set_active(ConversationKey::Peer(PeerId::from(PEER_B)));

    let actions = client.send_chat(&MessageBody::Text("oops".to_string()));
    let (_, sent) = publishes(&actions).remove(0);

    let actions = client.send_delete(&sent.timestamp);
    assert!(client.history(&ConversationKey::Peer(PeerId::from(PEER_B))).is_empty());

    let sent_deletes = publishes(&actions);
    assert_eq!(sent_deletes.len(), 1);
    let (destination, envelope) = &sent_deletes[0];
    assert_eq!(*destination, Destination::Direct(PeerId::from(PEER_B)));
    assert_eq!(envelope.kind, FrameKind::Chat);
    match envelope.body() {
        MessageBody::Delete { target } => assert_eq!(target, sent.timestamp),
        other => panic!("expected delete body, got {other:?}"),
    }
}

#[test]
fn redelivered_frame_is_stored_once() {
    let env = MockEnv::new();
    let mut client = client(&env);

    let msg = chat_from(PEER_B, None, "hello", "2024-01-01T00:00:01.000Z");
    deliver(&mut client, Channel::Public, &msg);
    deliver(&mut client, Channel::Public, &msg);

    assert_eq!(client.history(&ConversationKey::Public).len(), 1);
}

#[test]
fn typing_indicator_expires_after_quiet_period() {
    let env = MockEnv::new();
    let mut client = client(&env);

    let typing = Envelope::typing(PeerId::from(PEER_B), None);
    deliver(&mut client, Channel::Public, &typing);
    assert!(client.typing_indicator(&ConversationKey::Public).is_some());

    env.advance(Duration::from_millis(1999));
    tick(&mut client, &env);
    assert!(client.typing_indicator(&ConversationKey::Public).is_some());

    env.advance(Duration::from_millis(1));
    tick(&mut client, &env);
    assert!(client.typing_indicator(&ConversationKey::Public).is_none());
}

#[test]
fn typing_refresh_restarts_the_timer() {
    let env = MockEnv::new();
    let mut client = client(&env);

    let typing = Envelope::typing(PeerId::from(PEER_B), Some(PeerId::from(LOCAL)));
    let key = ConversationKey::Peer(PeerId::from(PEER_B));

    deliver(&mut client, Channel::Private, &typing);
    env.advance(Duration::from_millis(1000));
    deliver(&mut client, Channel::Private, &typing);

    // 2500ms after the first frame, 1500ms after the refresh: still live.
    env.advance(Duration::from_millis(1500));
    tick(&mut client, &env);
    assert!(client.typing_indicator(&key).is_some());

    // 3000ms after the first frame the restarted timer fires.
    env.advance(Duration::from_millis(500));
    tick(&mut client, &env);
    assert!(client.typing_indicator(&key).is_none());
}

#[test]
fn own_typing_frames_are_ignored() {
    let env = MockEnv::new();
    let mut client = client(&env);

    let typing = Envelope::typing(PeerId::from(LOCAL), None);
    deliver(&mut client, Channel::Public, &typing);
    assert!(client.typing_indicator(&ConversationKey::Public).is_none());
}

#[test]
fn three_keystrokes_in_a_second_emit_one_typing_frame() {
    let env = MockEnv::new();
    let mut client = client(&env);

    let mut frames = 0;
    for _ in 0..3 {
        frames += publishes(&client.send_typing()).len();
        env.advance(Duration::from_millis(500));
    }
    assert_eq!(frames, 1);
}

#[test]
fn disconnected_send_transmits_nothing_and_reconnects() {
    let env = MockEnv::new();
    let mut client = Client::new(env, PeerId::from(LOCAL), EngineConfig::default());
    client.set_active(ConversationKey::Peer(PeerId::from(PEER_B)));

    let actions = client.send_chat(&MessageBody::Text("hi".to_string()));

    assert!(publishes(&actions).is_empty());
    assert!(actions.iter().any(|a| matches!(a, ClientAction::Notice { .. })));
    assert!(actions.contains(&ClientAction::Connect));
    assert!(client.history(&ConversationKey::Peer(PeerId::from(PEER_B))).is_empty());
}

#[test]
fn private_message_receipt_depends_on_focus() {
    let env = MockEnv::new();
    let mut client = client(&env);
    client.set_active(ConversationKey::Peer(PeerId::from(PEER_B)));

    // Focused conversation: SEEN receipt, no notification.
    let from_b = chat_from(PEER_B, Some(LOCAL), "hi", "2024-01-01T00:00:01.000Z");
    let actions = deliver(&mut client, Channel::Private, &from_b);
    let sent = publishes(&actions);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.kind, FrameKind::Seen);
    assert_eq!(sent[0].0, Destination::Direct(PeerId::from(PEER_B)));
    assert!(!actions.iter().any(|a| matches!(a, ClientAction::Notify(_))));
    assert_eq!(client.history(&ConversationKey::Peer(PeerId::from(PEER_B))).len(), 1);

    // Unfocused conversation: DELIVERED receipt plus a notification signal.
    let from_c = chat_from(PEER_C, Some(LOCAL), "psst", "2024-01-01T00:00:02.000Z");
    let actions = deliver(&mut client, Channel::Private, &from_c);
    let sent = publishes(&actions);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.kind, FrameKind::Delivered);
    assert!(actions.iter().any(|a| matches!(a, ClientAction::Notify(_))));
}

#[test]
fn receipts_rewrite_local_authored_statuses() {
    let env = MockEnv::new();
    let mut client = client(&env);
    client.set_active(ConversationKey::Peer(PeerId::from(PEER_B)));
    client.send_chat(&MessageBody::Text("one".to_string()));
    client.send_chat(&MessageBody::Text("two".to_string()));

    let delivered = Envelope {
        sender: PeerId::from(PEER_B),
        receiver: Some(PeerId::from(LOCAL)),
        content: String::new(),
        kind: FrameKind::Delivered,
        status: None,
        timestamp: Timestamp::default(),
    };
    deliver(&mut client, Channel::Private, &delivered);

    let key = ConversationKey::Peer(PeerId::from(PEER_B));
    assert!(
        client
            .history(&key)
            .iter()
            .all(|m| m.status == Some(DeliveryStatus::Delivered))
    );
}

#[test]
fn switching_to_a_peer_fetches_history_and_marks_seen() {
    let env = MockEnv::new();
    let mut client = client(&env);

    let actions = client.set_active(ConversationKey::Peer(PeerId::from(PEER_B)));
    assert!(actions.contains(&ClientAction::FetchHistory(PeerId::from(PEER_B))));
    let sent = publishes(&actions);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.kind, FrameKind::Seen);

    // The public room never triggers a fetch.
    let actions = client.set_active(ConversationKey::Public);
    assert!(actions.is_empty());
}

#[test]
fn history_load_replaces_the_log_wholesale() {
    let env = MockEnv::new();
    let mut client = client(&env);
    let peer_d = PeerId::from("444");
    client.set_active(ConversationKey::Peer(peer_d.clone()));

    // Optimistic local-only entry, then the fetch lands.
    client.send_chat(&MessageBody::Text("optimistic".to_string()));
    let fetched = vec![chat_from("444", Some(LOCAL), "canonical", "2024-01-01T00:00:01.000Z")];
    client
        .handle(ClientEvent::HistoryLoaded { peer: peer_d.clone(), messages: fetched.clone() })
        .expect("history loaded");

    assert_eq!(client.history(&ConversationKey::Peer(peer_d)), fetched.as_slice());
}
