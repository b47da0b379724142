use std::fmt;
use std::sync::Arc;

use crate::application::ports::{
    FileStorage, FileStorageError, IngestJobPayload, JobQueue, JobQueueError,
};
use crate::domain::entities::{Document, IngestionJob};
use crate::domain::repositories::{
    DocumentRepository, DocumentRepositoryError, JobRepository, JobRepositoryError,
};
use crate::domain::value_objects::{ContentHash, ProcessingStatus};

#[derive(Debug)]
pub enum IntakeError {
    StorageError(String),
    DatabaseError(String),
    QueueError(String),
}

impl fmt::Display for IntakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntakeError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            IntakeError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            IntakeError::QueueError(msg) => write!(f, "Queue error: {}", msg),
        }
    }
}

impl std::error::Error for IntakeError {}

impl From<FileStorageError> for IntakeError {
    fn from(e: FileStorageError) -> Self {
        IntakeError::StorageError(e.to_string())
    }
}

impl From<DocumentRepositoryError> for IntakeError {
    fn from(e: DocumentRepositoryError) -> Self {
        IntakeError::DatabaseError(e.to_string())
    }
}

impl From<JobRepositoryError> for IntakeError {
    fn from(e: JobRepositoryError) -> Self {
        IntakeError::DatabaseError(e.to_string())
    }
}

impl From<JobQueueError> for IntakeError {
    fn from(e: JobQueueError) -> Self {
        IntakeError::QueueError(e.to_string())
    }
}

/// Result of admitting an upload. `job` is `None` when no new work was
/// scheduled: the prior document is either already completed or still in
/// flight, and is returned as-is.
#[derive(Debug)]
pub struct IntakeOutcome {
    pub document: Document,
    pub job: Option<IngestionJob>,
    pub deduplicated: bool,
}

/// Content-addressed intake gate. Uploads are identified by the SHA-256 of
/// their bytes, so an identical file is never stored or processed twice.
pub struct IntakeService {
    documents: Arc<dyn DocumentRepository>,
    jobs: Arc<dyn JobRepository>,
    storage: Arc<dyn FileStorage>,
    queue: Arc<dyn JobQueue>,
}

impl IntakeService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        jobs: Arc<dyn JobRepository>,
        storage: Arc<dyn FileStorage>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            documents,
            jobs,
            storage,
            queue,
        }
    }

    pub async fn admit(
        &self,
        filename: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<IntakeOutcome, IntakeError> {
        let hash = ContentHash::from_bytes(data);

        if let Some(existing) = self.documents.find_by_hash(&hash).await? {
            if existing.is_completed() {
                tracing::info!(
                    document_id = %existing.id(),
                    "Upload matched a completed document, skipping reprocessing"
                );
                return Ok(IntakeOutcome {
                    document: existing,
                    job: None,
                    deduplicated: true,
                });
            }

            // A queued or processing document already has a live job; a
            // second one would collide with it mid-pipeline and fail the
            // document's status transitions.
            if matches!(
                existing.status(),
                ProcessingStatus::Queued | ProcessingStatus::Processing
            ) {
                tracing::info!(
                    document_id = %existing.id(),
                    status = %existing.status(),
                    "Upload matched a document already in flight, not re-enqueueing"
                );
                return Ok(IntakeOutcome {
                    document: existing,
                    job: None,
                    deduplicated: true,
                });
            }

            // Same bytes, earlier attempt failed. Reuse the stored file and
            // run a fresh job against it.
            tracing::info!(
                document_id = %existing.id(),
                status = %existing.status(),
                "Upload matched a failed document, reprocessing"
            );
            let job = self.enqueue_job(&existing).await?;
            return Ok(IntakeOutcome {
                document: existing,
                job: Some(job),
                deduplicated: true,
            });
        }

        let document_id = uuid::Uuid::new_v4();
        let storage_path = self.storage.save_upload(document_id, filename, data).await?;

        let document = Document::new(
            document_id,
            filename.to_string(),
            hash,
            mime_type.to_string(),
            storage_path,
        );
        self.documents.insert(&document).await?;

        let job = self.enqueue_job(&document).await?;
        tracing::info!(
            document_id = %document.id(),
            job_id = %job.id(),
            filename,
            "Accepted new document for ingestion"
        );

        Ok(IntakeOutcome {
            document,
            job: Some(job),
            deduplicated: false,
        })
    }

    async fn enqueue_job(&self, document: &Document) -> Result<IngestionJob, IntakeError> {
        let job = IngestionJob::new(document.id());
        self.jobs.insert(&job).await?;
        self.queue
            .enqueue(IngestJobPayload {
                job_id: job.id(),
                document_id: document.id(),
            })
            .await?;
        Ok(job)
    }
}
