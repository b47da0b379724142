use async_trait::async_trait;

use crate::domain::entities::ExternalSnippet;

#[derive(Debug)]
pub enum KnowledgeSourceError {
    NetworkError(String),
    InvalidResponse(String),
}

impl std::fmt::Display for KnowledgeSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KnowledgeSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            KnowledgeSourceError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for KnowledgeSourceError {}

/// The single allow-listed external provider. The enrichment gate checks
/// `summary_url` against the trust list before ever calling `fetch_summary`.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// The URL `fetch_summary` would request for this topic.
    fn summary_url(&self, topic: &str) -> String;

    /// A short citable snippet for the topic, or None when the provider
    /// has nothing useful (missing page, empty extract).
    async fn fetch_summary(
        &self,
        topic: &str,
    ) -> Result<Option<ExternalSnippet>, KnowledgeSourceError>;
}
