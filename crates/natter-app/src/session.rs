//! Persisted local session state.
//!
//! A thin typed layer over the external key-value store holding the
//! authentication token, local identity, saved contacts, avatar, and the
//! last-activity stamp behind the idle-expiry check. The check runs once at
//! startup: a session idle past the window is cleared outright and the user
//! is forced back through authentication.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use natter_client::Contact;
use natter_proto::PeerId;

use crate::error::SessionError;

/// Idle window after which a stored session expires (5 days).
pub const IDLE_EXPIRY_MILLIS: i64 = 5 * 24 * 60 * 60 * 1000;

mod keys {
    pub const TOKEN: &str = "token";
    pub const PEER_ID: &str = "peer_id";
    pub const DISPLAY_NAME: &str = "display_name";
    pub const LAST_ACTIVITY: &str = "last_activity";
    pub const CONTACTS: &str = "contacts";
    pub const AVATAR: &str = "avatar";
}

/// External key-value store for persisted local state.
///
/// Must be Clone (shared with the runtime), Send + Sync, and synchronous —
/// the backing store is local, not a network service. Implementations
/// typically share internal state via Arc, so clones access the same
/// underlying storage.
pub trait SessionStore: Clone + Send + Sync + 'static {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn put(&self, key: &str, value: &str);

    /// Remove everything (logout, expiry).
    fn clear(&self);
}

/// The restored local identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Local peer identity.
    pub peer: PeerId,
    /// Display name shown to other users.
    pub display_name: String,
    /// Saved avatar reference, if any.
    pub avatar: Option<String>,
}

/// Typed access to one persisted session.
#[derive(Clone)]
pub struct Session<S> {
    store: S,
}

impl<S: SessionStore> Session<S> {
    /// Restore the persisted session, enforcing the idle-expiry check.
    ///
    /// Missing credentials or an exceeded idle window clear the store and
    /// force re-authentication; otherwise the activity stamp is refreshed.
    pub fn restore(store: S, now: DateTime<Utc>) -> Result<(Self, Profile), SessionError> {
        let token = store.get(keys::TOKEN);
        let peer = store.get(keys::PEER_ID);
        let (Some(_token), Some(peer)) = (token, peer) else {
            store.clear();
            return Err(SessionError::Unauthenticated);
        };

        if let Some(last) = store.get(keys::LAST_ACTIVITY).and_then(|s| s.parse::<i64>().ok())
            && now.timestamp_millis() - last > IDLE_EXPIRY_MILLIS
        {
            store.clear();
            return Err(SessionError::Expired);
        }
        store.put(keys::LAST_ACTIVITY, &now.timestamp_millis().to_string());

        let profile = Profile {
            peer: PeerId::from(peer.clone()),
            display_name: store.get(keys::DISPLAY_NAME).unwrap_or(peer),
            avatar: store.get(keys::AVATAR),
        };
        Ok((Self { store }, profile))
    }

    /// Refresh the last-activity stamp.
    pub fn touch(&self, now: DateTime<Utc>) {
        self.store.put(keys::LAST_ACTIVITY, &now.timestamp_millis().to_string());
    }

    /// Saved contact snapshot; empty (with a warning) on a corrupt record.
    pub fn contacts(&self) -> Vec<Contact> {
        let Some(raw) = self.store.get(keys::CONTACTS) else {
            return vec![];
        };
        match serde_json::from_str(&raw) {
            Ok(contacts) => contacts,
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupt contact record");
                vec![]
            },
        }
    }

    /// Persist a contact snapshot.
    pub fn save_contacts(&self, contacts: &[Contact]) {
        match serde_json::to_string(contacts) {
            Ok(raw) => self.store.put(keys::CONTACTS, &raw),
            Err(e) => tracing::warn!(error = %e, "failed to encode contact record"),
        }
    }

    /// Persist the avatar reference.
    pub fn save_avatar(&self, avatar: &str) {
        self.store.put(keys::AVATAR, avatar);
    }

    /// Persist a new display name.
    pub fn save_display_name(&self, name: &str) {
        self.store.put(keys::DISPLAY_NAME, name);
    }

    /// Clear everything and forget the session.
    pub fn logout(&self) {
        self.store.clear();
    }
}

/// In-memory store for tests and simulation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with credentials, as the authentication flow would.
    pub fn authenticated(peer: &str, token: &str, last_activity: DateTime<Utc>) -> Self {
        let store = Self::new();
        store.put(keys::PEER_ID, peer);
        store.put(keys::TOKEN, token);
        store.put(keys::LAST_ACTIVITY, &last_activity.timestamp_millis().to_string());
        store
    }
}

impl SessionStore for MemoryStore {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().expect("Mutex poisoned").get(key).cloned()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn put(&self, key: &str, value: &str) {
        self.inner.lock().expect("Mutex poisoned").insert(key.to_string(), value.to_string());
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn clear(&self) {
        self.inner.lock().expect("Mutex poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).single().expect("valid instant")
    }

    #[test]
    fn fresh_session_restores_and_touches() {
        let store = MemoryStore::authenticated("111", "tok", at(0));
        let (_, profile) = Session::restore(store.clone(), at(1000)).expect("restore");

        assert_eq!(profile.peer, PeerId::from("111"));
        assert_eq!(profile.display_name, "111");
        assert_eq!(store.get("last_activity"), Some("1000".to_string()));
    }

    #[test]
    fn idle_past_the_window_expires_and_clears() {
        let store = MemoryStore::authenticated("111", "tok", at(0));
        let result = Session::restore(store.clone(), at(IDLE_EXPIRY_MILLIS + 1));

        assert_eq!(result.err(), Some(SessionError::Expired));
        assert_eq!(store.get("token"), None);
    }

    #[test]
    fn idle_exactly_at_the_window_survives() {
        let store = MemoryStore::authenticated("111", "tok", at(0));
        assert!(Session::restore(store, at(IDLE_EXPIRY_MILLIS)).is_ok());
    }

    #[test]
    fn missing_credentials_force_authentication() {
        let store = MemoryStore::new();
        let result = Session::restore(store, at(0));
        assert_eq!(result.err(), Some(SessionError::Unauthenticated));
    }

    #[test]
    fn contacts_round_trip_and_survive_corruption() {
        let store = MemoryStore::authenticated("111", "tok", at(0));
        let (session, _) = Session::restore(store.clone(), at(0)).expect("restore");

        let contacts =
            vec![Contact { id: PeerId::from("222"), name: "Ada".to_string() }];
        session.save_contacts(&contacts);
        assert_eq!(session.contacts(), contacts);

        store.put("contacts", "{corrupt");
        assert!(session.contacts().is_empty());
    }

    #[test]
    fn logout_clears_everything() {
        let store = MemoryStore::authenticated("111", "tok", at(0));
        let (session, _) = Session::restore(store.clone(), at(0)).expect("restore");
        session.logout();
        assert_eq!(store.get("peer_id"), None);
    }
}
