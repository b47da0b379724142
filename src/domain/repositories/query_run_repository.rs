use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Feedback, QueryRun};

#[derive(Debug)]
pub enum QueryRunRepositoryError {
    DatabaseError(String),
    NotFound(Uuid),
}

impl std::fmt::Display for QueryRunRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryRunRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            QueryRunRepositoryError::NotFound(id) => write!(f, "Query run not found: {}", id),
        }
    }
}

impl std::error::Error for QueryRunRepositoryError {}

#[async_trait]
pub trait QueryRunRepository: Send + Sync {
    /// Query runs are append-only; there is no update operation.
    async fn insert(&self, run: &QueryRun) -> Result<(), QueryRunRepositoryError>;

    async fn exists(&self, id: Uuid) -> Result<bool, QueryRunRepositoryError>;

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), QueryRunRepositoryError>;
}
