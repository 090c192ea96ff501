//! Conversation history collaborator.
//!
//! The external store keeps the durable record of private conversations; the
//! engine replaces its in-memory log wholesale with whatever this API
//! returns when a conversation gains focus. Fetch failures are logged and
//! swallowed by the runtime — the conversation keeps the log it already had.

use std::future::Future;

use natter_proto::{Envelope, PeerId};

use crate::error::HistoryError;

/// Fetches the persisted log of a private conversation.
pub trait HistoryApi: Clone + Send + Sync + 'static {
    /// Fetch the ordered message log between the local peer and `peer`.
    fn fetch(
        &self,
        local: &PeerId,
        peer: &PeerId,
    ) -> impl Future<Output = Result<Vec<Envelope>, HistoryError>> + Send;
}

/// REST implementation over `GET {base}/conversations/{local}/{peer}`.
#[derive(Clone)]
pub struct RestHistory {
    base_url: String,
    http: reqwest::Client,
}

impl RestHistory {
    /// Create a client against the given API base url (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: reqwest::Client::new() }
    }
}

impl HistoryApi for RestHistory {
    async fn fetch(&self, local: &PeerId, peer: &PeerId) -> Result<Vec<Envelope>, HistoryError> {
        let url = format!("{}/conversations/{local}/{peer}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| HistoryError::Request(e.to_string()))?;

        response.json::<Vec<Envelope>>().await.map_err(|e| HistoryError::Payload(e.to_string()))
    }
}
