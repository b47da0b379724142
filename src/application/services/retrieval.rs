use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::application::ports::EmbeddingProvider;
use crate::domain::entities::RetrievedChunk;
use crate::domain::repositories::ChunkRepository;

pub const DEFAULT_TOP_K: i64 = 6;
pub const MAX_TOP_K: i64 = 20;

#[derive(Debug)]
pub enum RetrievalError {
    EmbeddingError(String),
    DatabaseError(String),
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            RetrievalError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for RetrievalError {}

/// Embeds a question and returns the nearest chunks from the index.
/// Only chunks of completed documents are searched, so half-ingested
/// documents never leak into answers.
pub struct RetrievalService {
    embeddings: Arc<dyn EmbeddingProvider>,
    chunks: Arc<dyn ChunkRepository>,
}

impl RetrievalService {
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>, chunks: Arc<dyn ChunkRepository>) -> Self {
        Self { embeddings, chunks }
    }

    pub async fn retrieve(
        &self,
        question: &str,
        top_k: Option<i64>,
        document_ids: Option<&[Uuid]>,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        let limit = top_k.unwrap_or(DEFAULT_TOP_K).clamp(1, MAX_TOP_K);
        let query_vector = self
            .embeddings
            .embed_one(question)
            .await
            .map_err(|e| RetrievalError::EmbeddingError(e.to_string()))?;
        let chunks = self
            .chunks
            .search(&query_vector, limit, document_ids)
            .await
            .map_err(|e| RetrievalError::DatabaseError(e.to_string()))?;
        tracing::debug!(limit, retrieved = chunks.len(), "Retrieved chunks for question");
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::EmbeddingProviderError;
    use crate::domain::entities::DocumentChunk;
    use crate::domain::repositories::ChunkRepositoryError;
    use async_trait::async_trait;
    use pgvector::Vector;
    use std::sync::Mutex;

    struct FakeEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for FakeEmbeddings {
        async fn embed_batch(
            &self,
            texts: &[String],
        ) -> Result<Vec<Vector>, EmbeddingProviderError> {
            Ok(texts.iter().map(|_| Vector::from(vec![1.0, 0.0])).collect())
        }
    }

    struct RecordingChunkRepo {
        limits: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl ChunkRepository for RecordingChunkRepo {
        async fn replace_for_document(
            &self,
            _document_id: Uuid,
            _chunks: &[DocumentChunk],
        ) -> Result<(), ChunkRepositoryError> {
            Ok(())
        }

        async fn search(
            &self,
            _query_vector: &Vector,
            limit: i64,
            _document_ids: Option<&[Uuid]>,
        ) -> Result<Vec<RetrievedChunk>, ChunkRepositoryError> {
            self.limits.lock().unwrap().push(limit);
            Ok(vec![])
        }

        async fn count_for_document(
            &self,
            _document_id: Uuid,
        ) -> Result<i64, ChunkRepositoryError> {
            Ok(0)
        }
    }

    fn service() -> (RetrievalService, Arc<RecordingChunkRepo>) {
        let repo = Arc::new(RecordingChunkRepo {
            limits: Mutex::new(vec![]),
        });
        (
            RetrievalService::new(Arc::new(FakeEmbeddings), repo.clone()),
            repo,
        )
    }

    #[tokio::test]
    async fn test_default_top_k() {
        let (svc, repo) = service();
        svc.retrieve("what is the refund policy?", None, None)
            .await
            .unwrap();
        assert_eq!(*repo.limits.lock().unwrap(), vec![DEFAULT_TOP_K]);
    }

    #[tokio::test]
    async fn test_top_k_is_clamped_to_bounds() {
        let (svc, repo) = service();
        svc.retrieve("q", Some(0), None).await.unwrap();
        svc.retrieve("q", Some(50), None).await.unwrap();
        svc.retrieve("q", Some(-3), None).await.unwrap();
        assert_eq!(*repo.limits.lock().unwrap(), vec![1, MAX_TOP_K, 1]);
    }
}
