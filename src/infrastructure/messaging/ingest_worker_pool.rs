use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::IngestJobPayload;
use crate::application::services::IngestionPipeline;
use crate::infrastructure::messaging::MpscJobQueueReceiver;

/// Pulls queued ingestion payloads and drives them through the pipeline.
/// Transient failures (embedding provider, storage, database) are retried
/// with exponential backoff; anything else fails the job immediately.
pub struct IngestWorkerPool {
    receiver: Arc<MpscJobQueueReceiver>,
    pipeline: Arc<IngestionPipeline>,
    worker_count: usize,
    max_attempts: u32,
    backoff_ms: u64,
}

impl IngestWorkerPool {
    pub fn new(
        receiver: Arc<MpscJobQueueReceiver>,
        pipeline: Arc<IngestionPipeline>,
        worker_count: usize,
        max_attempts: u32,
        backoff_ms: u64,
    ) -> Self {
        Self {
            receiver,
            pipeline,
            worker_count: worker_count.max(1),
            max_attempts: max_attempts.max(1),
            backoff_ms,
        }
    }

    pub async fn start(&self) {
        tracing::info!(workers = self.worker_count, "Starting ingestion workers");

        let mut handles = Vec::new();
        for worker_id in 0..self.worker_count {
            let worker = self.clone_for_worker();
            handles.push(tokio::spawn(async move {
                worker.worker_loop(worker_id).await;
            }));
        }

        for (worker_id, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                tracing::error!(worker_id, error = %e, "Ingestion worker panicked");
            }
        }

        tracing::info!("Ingestion workers stopped");
    }

    fn clone_for_worker(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            pipeline: self.pipeline.clone(),
            worker_count: self.worker_count,
            max_attempts: self.max_attempts,
            backoff_ms: self.backoff_ms,
        }
    }

    async fn worker_loop(&self, worker_id: usize) {
        tracing::info!(worker_id, "Worker started");

        while let Some(payload) = self.receiver.recv().await {
            self.process_with_retry(worker_id, payload).await;
        }

        tracing::info!(worker_id, "Worker stopped, queue closed");
    }

    async fn process_with_retry(&self, worker_id: usize, payload: IngestJobPayload) {
        for attempt in 1..=self.max_attempts {
            match self.pipeline.run(payload).await {
                Ok(()) => {
                    tracing::info!(worker_id, job_id = %payload.job_id, "Ingestion job completed");
                    return;
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay_ms = self.backoff_ms * 2u64.pow(attempt - 1);
                    tracing::warn!(
                        worker_id,
                        job_id = %payload.job_id,
                        attempt,
                        delay_ms,
                        error = %e,
                        "Ingestion attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => {
                    tracing::error!(
                        worker_id,
                        job_id = %payload.job_id,
                        attempt,
                        error = %e,
                        "Ingestion job failed"
                    );
                    return;
                }
            }
        }
    }
}
