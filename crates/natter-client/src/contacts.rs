//! Durable contact directory.
//!
//! Maps peer identifiers to display names. Independent of presence: a
//! contact survives reconnects, and whether it is online is the presence
//! tracker's business. The directory itself is in-memory; durability is the
//! caller's, via the snapshot carried on
//! [`crate::ClientAction::PersistContacts`].

use std::collections::HashMap;

use natter_proto::PeerId;
use serde::{Deserialize, Serialize};

/// A saved contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Stable peer identity.
    pub id: PeerId,
    /// Name shown in place of the bare id.
    pub name: String,
}

/// Peer id → display name directory.
#[derive(Debug, Clone)]
pub struct ContactDirectory {
    names: HashMap<PeerId, String>,
}

impl ContactDirectory {
    /// Create a directory pre-seeded with the assistant contact.
    pub fn seeded(assistant: Contact) -> Self {
        let mut names = HashMap::new();
        names.insert(assistant.id, assistant.name);
        Self { names }
    }

    /// Insert or rename a contact. Returns whether anything changed.
    pub fn insert(&mut self, contact: Contact) -> bool {
        self.names.insert(contact.id, contact.name.clone()) != Some(contact.name)
    }

    /// Register a previously unknown sender under its bare id.
    /// Returns whether the directory changed.
    pub fn register(&mut self, id: &PeerId) -> bool {
        if self.names.contains_key(id) {
            return false;
        }
        self.names.insert(id.clone(), id.to_string());
        true
    }

    /// Bulk phonebook-style import. Returns how many entries changed.
    pub fn import(&mut self, entries: impl IntoIterator<Item = Contact>) -> usize {
        entries.into_iter().filter(|c| self.insert(c.clone())).count()
    }

    /// Whether a peer is saved.
    pub fn contains(&self, id: &PeerId) -> bool {
        self.names.contains_key(id)
    }

    /// Display name for a peer, falling back to the bare id.
    pub fn display_name<'a>(&'a self, id: &'a PeerId) -> &'a str {
        self.names.get(id).map_or(id.as_str(), String::as_str)
    }

    /// Stable snapshot for persistence, ordered by peer id.
    pub fn snapshot(&self) -> Vec<Contact> {
        let mut entries: Vec<Contact> = self
            .names
            .iter()
            .map(|(id, name)| Contact { id: id.clone(), name: name.clone() })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }
}
