use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{EmbeddingProvider, FileStorage, IngestJobPayload, TextExtractor};
use crate::application::services::segmenter::TextSegmenter;
use crate::domain::entities::{Document, DocumentChunk, IngestionJob};
use crate::domain::repositories::{
    ChunkRepository, DocumentRepository, JobRepository, JobUpdate,
};
use crate::domain::value_objects::{IngestionStage, ProcessingStatus};

#[derive(Debug)]
pub enum PipelineError {
    JobNotFound(uuid::Uuid),
    DocumentNotFound(uuid::Uuid),
    InvalidState(String),
    ExtractionError(String),
    NoExtractableText,
    EmbeddingError(String),
    StorageError(String),
    DatabaseError(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::JobNotFound(id) => write!(f, "Job not found: {}", id),
            PipelineError::DocumentNotFound(id) => write!(f, "Document not found: {}", id),
            PipelineError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            PipelineError::ExtractionError(msg) => write!(f, "Extraction error: {}", msg),
            PipelineError::NoExtractableText => {
                write!(f, "Document produced no extractable text")
            }
            PipelineError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            PipelineError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            PipelineError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

impl PipelineError {
    /// Transient failures are worth another attempt; a document that has no
    /// extractable text will not grow one on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::EmbeddingError(_)
                | PipelineError::StorageError(_)
                | PipelineError::DatabaseError(_)
        )
    }
}

/// Runs a queued ingestion job through its stages: extract, chunk, embed,
/// index. Each stage advance is persisted before the next stage starts, so
/// an observer polling the job sees monotonically increasing progress. Any
/// failure marks both the job and the document failed and is returned to
/// the caller, which owns retry.
pub struct IngestionPipeline {
    documents: Arc<dyn DocumentRepository>,
    jobs: Arc<dyn JobRepository>,
    chunks: Arc<dyn ChunkRepository>,
    extractor: Arc<dyn TextExtractor>,
    embeddings: Arc<dyn EmbeddingProvider>,
    storage: Arc<dyn FileStorage>,
    segmenter: TextSegmenter,
}

impl IngestionPipeline {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        jobs: Arc<dyn JobRepository>,
        chunks: Arc<dyn ChunkRepository>,
        extractor: Arc<dyn TextExtractor>,
        embeddings: Arc<dyn EmbeddingProvider>,
        storage: Arc<dyn FileStorage>,
        segmenter: TextSegmenter,
    ) -> Self {
        Self {
            documents,
            jobs,
            chunks,
            extractor,
            embeddings,
            storage,
            segmenter,
        }
    }

    pub async fn run(&self, payload: IngestJobPayload) -> Result<(), PipelineError> {
        let mut job = self
            .jobs
            .find_by_id(payload.job_id)
            .await
            .map_err(|e| PipelineError::DatabaseError(e.to_string()))?
            .ok_or(PipelineError::JobNotFound(payload.job_id))?;
        let mut document = self
            .documents
            .find_by_id(payload.document_id)
            .await
            .map_err(|e| PipelineError::DatabaseError(e.to_string()))?
            .ok_or(PipelineError::DocumentNotFound(payload.document_id))?;

        match self.process(&mut job, &mut document).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.record_failure(&mut job, &mut document, &e).await;
                Err(e)
            }
        }
    }

    async fn process(
        &self,
        job: &mut IngestionJob,
        document: &mut Document,
    ) -> Result<(), PipelineError> {
        job.begin().map_err(PipelineError::InvalidState)?;
        self.persist_job(job).await?;
        self.set_document_status(document, ProcessingStatus::Processing)
            .await?;
        tracing::info!(job_id = %job.id(), document_id = %document.id(), "Ingestion started");

        let text = self
            .extractor
            .extract(document.mime_type(), Path::new(document.storage_path()))
            .await
            .map_err(|e| PipelineError::ExtractionError(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(PipelineError::NoExtractableText);
        }
        let text_path = self
            .storage
            .save_extracted_text(document.id(), &text)
            .await
            .map_err(|e| PipelineError::StorageError(e.to_string()))?;
        self.documents
            .set_text_path(document.id(), &text_path)
            .await
            .map_err(|e| PipelineError::DatabaseError(e.to_string()))?;
        document.set_text_path(text_path);
        self.advance(job, IngestionStage::TextExtracted).await?;

        let segments = self.segmenter.segment(&text);
        if segments.is_empty() {
            return Err(PipelineError::NoExtractableText);
        }
        self.advance(job, IngestionStage::Chunked).await?;

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let vectors = self
            .embeddings
            .embed_batch(&texts)
            .await
            .map_err(|e| PipelineError::EmbeddingError(e.to_string()))?;
        if vectors.len() != segments.len() {
            return Err(PipelineError::EmbeddingError(format!(
                "expected {} vectors, got {}",
                segments.len(),
                vectors.len()
            )));
        }
        self.advance(job, IngestionStage::EmbeddingCreated).await?;

        let chunks: Vec<DocumentChunk> = segments
            .into_iter()
            .zip(vectors)
            .map(|(segment, vector)| {
                DocumentChunk::new(
                    document.id(),
                    segment.index,
                    segment.text,
                    segment.token_estimate,
                    vector,
                )
            })
            .collect();
        let chunk_count = chunks.len();
        self.chunks
            .replace_for_document(document.id(), &chunks)
            .await
            .map_err(|e| PipelineError::DatabaseError(e.to_string()))?;
        self.advance(job, IngestionStage::Indexed).await?;

        job.complete().map_err(PipelineError::InvalidState)?;
        self.persist_job(job).await?;
        self.set_document_status(document, ProcessingStatus::Completed)
            .await?;
        tracing::info!(
            job_id = %job.id(),
            document_id = %document.id(),
            chunk_count,
            "Ingestion completed"
        );
        Ok(())
    }

    async fn advance(
        &self,
        job: &mut IngestionJob,
        stage: IngestionStage,
    ) -> Result<(), PipelineError> {
        job.advance_to(stage).map_err(PipelineError::InvalidState)?;
        self.persist_job(job).await?;
        tracing::debug!(job_id = %job.id(), stage = %stage, progress = job.progress(), "Stage reached");
        Ok(())
    }

    async fn persist_job(&self, job: &IngestionJob) -> Result<(), PipelineError> {
        self.jobs
            .update(job.id(), JobUpdate::from_job(job))
            .await
            .map_err(|e| PipelineError::DatabaseError(e.to_string()))
    }

    async fn set_document_status(
        &self,
        document: &mut Document,
        status: ProcessingStatus,
    ) -> Result<(), PipelineError> {
        document
            .transition_to(status)
            .map_err(PipelineError::InvalidState)?;
        self.documents
            .set_status(document.id(), status)
            .await
            .map_err(|e| PipelineError::DatabaseError(e.to_string()))
    }

    /// Best-effort bookkeeping once processing has already failed. Persistence
    /// errors here are logged, not returned; the original failure wins.
    async fn record_failure(
        &self,
        job: &mut IngestionJob,
        document: &mut Document,
        error: &PipelineError,
    ) {
        tracing::error!(job_id = %job.id(), document_id = %document.id(), %error, "Ingestion failed");
        if job.fail(error.to_string()).is_ok() {
            if let Err(e) = self.jobs.update(job.id(), JobUpdate::from_job(job)).await {
                tracing::error!(job_id = %job.id(), %e, "Failed to persist job failure");
            }
        }
        if document.transition_to(ProcessingStatus::Failed).is_ok() {
            if let Err(e) = self
                .documents
                .set_status(document.id(), ProcessingStatus::Failed)
                .await
            {
                tracing::error!(document_id = %document.id(), %e, "Failed to persist document failure");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        EmbeddingProviderError, FileStorageError, TextExtractionError,
    };
    use crate::domain::entities::RetrievedChunk;
    use crate::domain::repositories::{
        ChunkRepositoryError, DocumentRepositoryError, JobRepositoryError,
    };
    use crate::domain::value_objects::ContentHash;
    use async_trait::async_trait;
    use pgvector::Vector;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct FakeDocumentRepo {
        document: Mutex<Option<Document>>,
        statuses: Mutex<Vec<ProcessingStatus>>,
    }

    #[async_trait]
    impl DocumentRepository for FakeDocumentRepo {
        async fn insert(&self, _document: &Document) -> Result<(), DocumentRepositoryError> {
            Ok(())
        }

        async fn find_by_id(
            &self,
            _id: Uuid,
        ) -> Result<Option<Document>, DocumentRepositoryError> {
            Ok(self.document.lock().unwrap().clone())
        }

        async fn find_by_hash(
            &self,
            _hash: &ContentHash,
        ) -> Result<Option<Document>, DocumentRepositoryError> {
            Ok(None)
        }

        async fn list_recent(
            &self,
            _limit: i64,
        ) -> Result<Vec<Document>, DocumentRepositoryError> {
            Ok(vec![])
        }

        async fn set_status(
            &self,
            _id: Uuid,
            status: ProcessingStatus,
        ) -> Result<(), DocumentRepositoryError> {
            self.statuses.lock().unwrap().push(status);
            Ok(())
        }

        async fn set_text_path(
            &self,
            _id: Uuid,
            _text_path: &str,
        ) -> Result<(), DocumentRepositoryError> {
            Ok(())
        }
    }

    struct FakeJobRepo {
        job: Mutex<Option<IngestionJob>>,
        updates: Mutex<Vec<JobUpdate>>,
    }

    #[async_trait]
    impl JobRepository for FakeJobRepo {
        async fn insert(&self, _job: &IngestionJob) -> Result<(), JobRepositoryError> {
            Ok(())
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError> {
            Ok(self.job.lock().unwrap().clone())
        }

        async fn update(&self, _id: Uuid, update: JobUpdate) -> Result<(), JobRepositoryError> {
            self.updates.lock().unwrap().push(update);
            Ok(())
        }
    }

    struct FakeChunkRepo {
        replaced: Mutex<Vec<(Uuid, usize)>>,
    }

    #[async_trait]
    impl ChunkRepository for FakeChunkRepo {
        async fn replace_for_document(
            &self,
            document_id: Uuid,
            chunks: &[DocumentChunk],
        ) -> Result<(), ChunkRepositoryError> {
            self.replaced.lock().unwrap().push((document_id, chunks.len()));
            Ok(())
        }

        async fn search(
            &self,
            _query_vector: &Vector,
            _limit: i64,
            _document_ids: Option<&[Uuid]>,
        ) -> Result<Vec<RetrievedChunk>, ChunkRepositoryError> {
            Ok(vec![])
        }

        async fn count_for_document(
            &self,
            _document_id: Uuid,
        ) -> Result<i64, ChunkRepositoryError> {
            Ok(0)
        }
    }

    struct FakeExtractor {
        text: Result<String, String>,
    }

    #[async_trait]
    impl TextExtractor for FakeExtractor {
        async fn extract(
            &self,
            _mime_type: &str,
            _storage_path: &Path,
        ) -> Result<String, TextExtractionError> {
            self.text
                .clone()
                .map_err(TextExtractionError::ExtractionFailed)
        }
    }

    struct FakeEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for FakeEmbeddings {
        async fn embed_batch(
            &self,
            texts: &[String],
        ) -> Result<Vec<Vector>, EmbeddingProviderError> {
            Ok(texts.iter().map(|_| Vector::from(vec![0.1, 0.2])).collect())
        }
    }

    struct FakeStorage;

    #[async_trait]
    impl FileStorage for FakeStorage {
        async fn save_upload(
            &self,
            document_id: Uuid,
            original_name: &str,
            _data: &[u8],
        ) -> Result<String, FileStorageError> {
            Ok(format!("uploads/{}_{}", document_id, original_name))
        }

        async fn save_extracted_text(
            &self,
            document_id: Uuid,
            _text: &str,
        ) -> Result<String, FileStorageError> {
            Ok(format!("text/{}.txt", document_id))
        }
    }

    struct Fixture {
        pipeline: IngestionPipeline,
        docs: Arc<FakeDocumentRepo>,
        jobs: Arc<FakeJobRepo>,
        chunks: Arc<FakeChunkRepo>,
        payload: IngestJobPayload,
    }

    fn fixture(extracted: Result<String, String>) -> Fixture {
        let document = Document::new(
            Uuid::new_v4(),
            "notes.txt".to_string(),
            ContentHash::from_bytes(b"notes"),
            "text/plain".to_string(),
            "uploads/notes.txt".to_string(),
        );
        let job = IngestionJob::new(document.id());
        let payload = IngestJobPayload {
            job_id: job.id(),
            document_id: document.id(),
        };

        let docs = Arc::new(FakeDocumentRepo {
            document: Mutex::new(Some(document)),
            statuses: Mutex::new(vec![]),
        });
        let jobs = Arc::new(FakeJobRepo {
            job: Mutex::new(Some(job)),
            updates: Mutex::new(vec![]),
        });
        let chunks = Arc::new(FakeChunkRepo {
            replaced: Mutex::new(vec![]),
        });
        let pipeline = IngestionPipeline::new(
            docs.clone(),
            jobs.clone(),
            chunks.clone(),
            Arc::new(FakeExtractor { text: extracted }),
            Arc::new(FakeEmbeddings),
            Arc::new(FakeStorage),
            TextSegmenter::new(100, 20).unwrap(),
        );
        Fixture {
            pipeline,
            docs,
            jobs,
            chunks,
            payload,
        }
    }

    #[tokio::test]
    async fn test_successful_run_walks_every_checkpoint() {
        let fx = fixture(Ok("hello world ".repeat(40)));

        fx.pipeline.run(fx.payload).await.unwrap();

        let updates = fx.jobs.updates.lock().unwrap();
        let progress: Vec<i32> = updates.iter().filter_map(|u| u.progress).collect();
        assert_eq!(progress, vec![5, 20, 40, 70, 90, 100]);

        let statuses = fx.docs.statuses.lock().unwrap();
        assert_eq!(
            *statuses,
            vec![ProcessingStatus::Processing, ProcessingStatus::Completed]
        );
        assert_eq!(fx.chunks.replaced.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_marks_job_and_document_failed() {
        let fx = fixture(Err("broken file".to_string()));

        let err = fx.pipeline.run(fx.payload).await.unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionError(_)));

        let updates = fx.jobs.updates.lock().unwrap();
        let last = updates.last().unwrap();
        assert_eq!(last.status, Some(ProcessingStatus::Failed));
        assert!(last.error_message.clone().flatten().is_some());

        let statuses = fx.docs.statuses.lock().unwrap();
        assert_eq!(statuses.last(), Some(&ProcessingStatus::Failed));
        assert!(fx.chunks.replaced.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_extraction_fails_the_job() {
        let fx = fixture(Ok("   \n\n  ".to_string()));

        let err = fx.pipeline.run(fx.payload).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoExtractableText));
    }

    #[tokio::test]
    async fn test_failed_job_can_be_rerun_to_completion() {
        let fx = fixture(Ok("usable text ".repeat(30)));

        // Simulate a previously failed attempt.
        {
            let mut job_slot = fx.jobs.job.lock().unwrap();
            let job = job_slot.as_mut().unwrap();
            job.begin().unwrap();
            job.fail("transient embedding outage".to_string()).unwrap();
            let mut doc_slot = fx.docs.document.lock().unwrap();
            let doc = doc_slot.as_mut().unwrap();
            doc.transition_to(ProcessingStatus::Processing).unwrap();
            doc.transition_to(ProcessingStatus::Failed).unwrap();
        }

        fx.pipeline.run(fx.payload).await.unwrap();

        let updates = fx.jobs.updates.lock().unwrap();
        let last = updates.last().unwrap();
        assert_eq!(last.status, Some(ProcessingStatus::Completed));
        // The retry clears the stale error message.
        let first = updates.first().unwrap();
        assert_eq!(first.error_message, Some(None));
    }
}
