use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, Error as ReqwestError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    CompletionProvider, CompletionProviderError, EmbeddingProvider, EmbeddingProviderError,
};
use crate::config::AppConfig;

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_factor: f64,
}

impl OpenAiClientConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
            max_retries: 3,
            timeout_secs: 60,
            backoff_factor: 1.5,
        }
    }
}

#[derive(Debug)]
enum ApiCallError {
    RequestError(String),
    StatusError(u16, String),
    ParseError(String),
}

impl ApiCallError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiCallError::RequestError(_) => true,
            ApiCallError::StatusError(code, _) => *code == 429 || *code >= 500,
            ApiCallError::ParseError(_) => false,
        }
    }
}

impl std::fmt::Display for ApiCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiCallError::RequestError(msg) => write!(f, "Request error: {}", msg),
            ApiCallError::StatusError(code, body) => write!(f, "HTTP {}: {}", code, body),
            ApiCallError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

/// OpenAI-compatible API client backing both the embedding and completion
/// ports. Transient failures (network errors, 429, 5xx) are retried with
/// exponential backoff; anything else surfaces immediately.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiClientConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    async fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp, ApiCallError> {
        let mut attempts = 0;
        loop {
            attempts += 1;

            match self.execute::<Req, Resp>(path, request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if !e.is_retryable() || attempts > self.config.max_retries {
                        return Err(e);
                    }
                    let backoff = Duration::from_millis(
                        (self.config.backoff_factor.powi(attempts as i32 - 1) * 1000.0) as u64,
                    );
                    tracing::warn!(path, attempts, error = %e, "Retrying API call");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn execute<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp, ApiCallError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiCallError::RequestError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiCallError::StatusError(status.as_u16(), body));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| ApiCallError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>, EmbeddingProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingsRequest {
            model: &self.config.embedding_model,
            input: texts,
        };
        let mut response: EmbeddingsResponse = self
            .post_json("/embeddings", &request)
            .await
            .map_err(|e| match e {
                ApiCallError::RequestError(msg) => EmbeddingProviderError::NetworkError(msg),
                ApiCallError::StatusError(code, body) => {
                    EmbeddingProviderError::ApiError(format!("HTTP {}: {}", code, body))
                }
                ApiCallError::ParseError(msg) => EmbeddingProviderError::InvalidResponse(msg),
            })?;

        if response.data.len() != texts.len() {
            return Err(EmbeddingProviderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        // The API does not guarantee input order.
        response.data.sort_by_key(|d| d.index);
        Ok(response
            .data
            .into_iter()
            .map(|d| Vector::from(d.embedding))
            .collect())
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, CompletionProviderError> {
        let request = ChatRequest {
            model: &self.config.chat_model,
            temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let response: ChatResponse = self
            .post_json("/chat/completions", &request)
            .await
            .map_err(|e| match e {
                ApiCallError::RequestError(msg) => CompletionProviderError::NetworkError(msg),
                ApiCallError::StatusError(code, body) => {
                    CompletionProviderError::ApiError(format!("HTTP {}: {}", code, body))
                }
                ApiCallError::ParseError(msg) => CompletionProviderError::InvalidResponse(msg),
            })?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}
