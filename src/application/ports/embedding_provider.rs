use async_trait::async_trait;
use pgvector::Vector;

#[derive(Debug)]
pub enum EmbeddingProviderError {
    NetworkError(String),
    ApiError(String),
    InvalidResponse(String),
}

impl std::fmt::Display for EmbeddingProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            EmbeddingProviderError::ApiError(msg) => write!(f, "API error: {}", msg),
            EmbeddingProviderError::InvalidResponse(msg) => {
                write!(f, "Invalid response: {}", msg)
            }
        }
    }
}

impl std::error::Error for EmbeddingProviderError {}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One fixed-length vector per input text, order preserved.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>, EmbeddingProviderError>;

    async fn embed_one(&self, text: &str) -> Result<Vector, EmbeddingProviderError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            EmbeddingProviderError::InvalidResponse("empty embedding batch".to_string())
        })
    }
}
