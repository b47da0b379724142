use async_trait::async_trait;
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::{DocumentChunk, RetrievedChunk};

#[derive(Debug)]
pub enum ChunkRepositoryError {
    DatabaseError(String),
}

impl std::fmt::Display for ChunkRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ChunkRepositoryError {}

#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Atomically replace the document's chunk set: delete every existing
    /// chunk and insert the new set inside one transaction, so readers
    /// never observe a partial or mixed-generation set.
    async fn replace_for_document(
        &self,
        document_id: Uuid,
        chunks: &[DocumentChunk],
    ) -> Result<(), ChunkRepositoryError>;

    /// Top-K chunks by ascending distance to the query vector. Only chunks
    /// of completed documents are eligible; ties break on ascending chunk id.
    async fn search(
        &self,
        query_vector: &Vector,
        limit: i64,
        document_ids: Option<&[Uuid]>,
    ) -> Result<Vec<RetrievedChunk>, ChunkRepositoryError>;

    async fn count_for_document(&self, document_id: Uuid) -> Result<i64, ChunkRepositoryError>;
}
