use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A short passage fetched from the trusted external source. Never
/// persisted; lives only for the duration of one query. The id is derived
/// from the source URL so the same page always yields the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSnippet {
    pub id: String,
    pub url: String,
    pub title: String,
    pub text: String,
}

impl ExternalSnippet {
    pub fn new(url: String, title: String, text: String) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let id = format!("{:x}", hasher.finalize());
        Self {
            id,
            url,
            title,
            text,
        }
    }
}
