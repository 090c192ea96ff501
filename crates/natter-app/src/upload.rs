//! Attachment upload collaborator.
//!
//! Attachments are stored out of band: the upload service returns a url and
//! the engine sends only the tagged reference (`IMAGE::url`,
//! `FILE::name::url`, `AUDIO::url`). Uploads are size-capped before any
//! bytes leave the process, failures surface as a user-visible notice, and
//! nothing is retried.

use std::future::Future;

use natter_proto::MessageBody;
use serde::Deserialize;

use crate::error::UploadError;

/// Upload size cap (20 MB).
pub const MAX_ATTACHMENT_BYTES: usize = 20 * 1024 * 1024;

/// Stores attachment bytes and returns a reachable url.
pub trait AttachmentStore: Clone + Send + Sync + 'static {
    /// Upload one attachment, returning its url.
    fn upload(
        &self,
        name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<String, UploadError>> + Send;
}

/// Wrap an uploaded url as the message body matching its media type.
pub fn body_for_upload(name: &str, mime: &str, url: String) -> MessageBody {
    if mime.starts_with("image/") {
        MessageBody::Image { url }
    } else if mime.starts_with("audio/") {
        MessageBody::Audio { url }
    } else {
        MessageBody::File { name: name.to_string(), url }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

/// REST implementation over multipart `POST {base}/attachments`.
#[derive(Clone)]
pub struct RestAttachments {
    base_url: String,
    http: reqwest::Client,
}

impl RestAttachments {
    /// Create a client against the given API base url (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: reqwest::Client::new() }
    }
}

impl AttachmentStore for RestAttachments {
    async fn upload(&self, name: &str, mime: &str, bytes: Vec<u8>) -> Result<String, UploadError> {
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(UploadError::TooLarge { size: bytes.len(), max: MAX_ATTACHMENT_BYTES });
        }

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(mime)
            .map_err(|e| UploadError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/attachments", self.base_url);
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| UploadError::Request(e.to_string()))?;

        let payload: UploadResponse =
            response.json().await.map_err(|e| UploadError::Payload(e.to_string()))?;
        Ok(payload.url)
    }
}
