use std::sync::Arc;

use crate::application::ports::KnowledgeSource;
use crate::domain::entities::ExternalSnippet;
use crate::domain::value_objects::TrustedDomains;

/// Fetches external evidence for a list of topics, gated by the trusted
/// domain allow-list. Fetches run sequentially and best-effort: a failed
/// or empty topic is skipped, never fatal, so enrichment degrades to
/// "no snippets" rather than failing the query.
pub struct ExternalEnrichment {
    source: Arc<dyn KnowledgeSource>,
    trusted: TrustedDomains,
    max_snippets: usize,
}

impl ExternalEnrichment {
    pub fn new(source: Arc<dyn KnowledgeSource>, trusted: TrustedDomains, max_snippets: usize) -> Self {
        Self {
            source,
            trusted,
            max_snippets,
        }
    }

    pub async fn enrich(&self, topics: &[String]) -> Vec<ExternalSnippet> {
        let mut snippets = Vec::new();

        for topic in topics.iter().take(self.max_snippets) {
            let url = self.source.summary_url(topic);
            if !self.trusted.is_trusted(&url) {
                tracing::warn!(topic, url, "Skipping untrusted enrichment URL");
                continue;
            }

            match self.source.fetch_summary(topic).await {
                Ok(Some(snippet)) => snippets.push(snippet),
                Ok(None) => {
                    tracing::debug!(topic, "No external summary available");
                }
                Err(e) => {
                    tracing::warn!(topic, error = %e, "External summary fetch failed");
                }
            }
        }

        snippets
    }
}
