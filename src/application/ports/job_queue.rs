use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The unit handed to the ingestion workers. Both ids must reference
/// persisted rows before the payload is enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestJobPayload {
    pub job_id: Uuid,
    pub document_id: Uuid,
}

#[derive(Debug)]
pub enum JobQueueError {
    QueueClosed,
    EnqueueFailed(String),
}

impl std::fmt::Display for JobQueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobQueueError::QueueClosed => write!(f, "Job queue is closed"),
            JobQueueError::EnqueueFailed(msg) => write!(f, "Enqueue failed: {}", msg),
        }
    }
}

impl std::error::Error for JobQueueError {}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, payload: IngestJobPayload) -> Result<(), JobQueueError>;

    async fn size(&self) -> usize;
}
