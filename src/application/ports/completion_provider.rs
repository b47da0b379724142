use async_trait::async_trait;

#[derive(Debug)]
pub enum CompletionProviderError {
    NetworkError(String),
    ApiError(String),
    InvalidResponse(String),
}

impl std::fmt::Display for CompletionProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            CompletionProviderError::ApiError(msg) => write!(f, "API error: {}", msg),
            CompletionProviderError::InvalidResponse(msg) => {
                write!(f, "Invalid response: {}", msg)
            }
        }
    }
}

impl std::error::Error for CompletionProviderError {}

/// Free-text generation. Callers own any JSON the model is asked to emit;
/// this port makes no promise beyond returning the raw completion text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, CompletionProviderError>;
}
