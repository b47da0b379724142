use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::value_objects::{ContentHash, ProcessingStatus};

#[derive(Debug)]
pub enum DocumentRepositoryError {
    DatabaseError(String),
    InvalidRecord(String),
}

impl std::fmt::Display for DocumentRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            DocumentRepositoryError::InvalidRecord(msg) => write!(f, "Invalid record: {}", msg),
        }
    }
}

impl std::error::Error for DocumentRepositoryError {}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn insert(&self, document: &Document) -> Result<(), DocumentRepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, DocumentRepositoryError>;

    async fn find_by_hash(
        &self,
        hash: &ContentHash,
    ) -> Result<Option<Document>, DocumentRepositoryError>;

    /// Most recent documents first, capped.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Document>, DocumentRepositoryError>;

    async fn set_status(
        &self,
        id: Uuid,
        status: ProcessingStatus,
    ) -> Result<(), DocumentRepositoryError>;

    async fn set_text_path(&self, id: Uuid, text_path: &str)
    -> Result<(), DocumentRepositoryError>;
}
