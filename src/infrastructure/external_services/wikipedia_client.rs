use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::application::ports::{KnowledgeSource, KnowledgeSourceError};
use crate::domain::entities::ExternalSnippet;

const SUMMARY_ENDPOINT: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";

#[derive(Deserialize)]
struct SummaryResponse {
    title: Option<String>,
    extract: Option<String>,
}

/// Wikipedia REST summary lookups, the single external knowledge provider.
/// A missing page or empty extract yields None rather than an error: the
/// caller treats external evidence as best-effort.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    client: Client,
}

impl WikipediaClient {
    pub fn new() -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl KnowledgeSource for WikipediaClient {
    fn summary_url(&self, topic: &str) -> String {
        let mut url = Url::parse(SUMMARY_ENDPOINT).expect("summary endpoint is a valid URL");
        url.path_segments_mut()
            .expect("summary endpoint has a path")
            .push(topic);
        url.to_string()
    }

    async fn fetch_summary(
        &self,
        topic: &str,
    ) -> Result<Option<ExternalSnippet>, KnowledgeSourceError> {
        let url = self.summary_url(topic);
        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| KnowledgeSourceError::NetworkError(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let summary: SummaryResponse = response
            .json()
            .await
            .map_err(|e| KnowledgeSourceError::InvalidResponse(e.to_string()))?;

        let text = summary.extract.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Ok(None);
        }

        let title = summary.title.unwrap_or_else(|| topic.to_string());
        Ok(Some(ExternalSnippet::new(url, title, text)))
    }
}
