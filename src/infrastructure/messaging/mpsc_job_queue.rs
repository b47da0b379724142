use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::application::ports::{IngestJobPayload, JobQueue, JobQueueError};

/// In-process ingestion queue. The sending half lives in the HTTP handlers
/// behind the `JobQueue` port; the receiving half is shared by the worker
/// pool. A payload counts as pending from enqueue until a worker pulls it.
pub struct MpscJobQueue {
    sender: mpsc::UnboundedSender<IngestJobPayload>,
    pending: Arc<Mutex<HashMap<Uuid, IngestJobPayload>>>,
}

impl MpscJobQueue {
    pub fn create_pair() -> (Self, MpscJobQueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(Mutex::new(HashMap::new()));

        let queue = Self {
            sender,
            pending: pending.clone(),
        };
        let queue_receiver = MpscJobQueueReceiver {
            receiver: Arc::new(Mutex::new(receiver)),
            pending,
        };

        (queue, queue_receiver)
    }
}

#[async_trait]
impl JobQueue for MpscJobQueue {
    async fn enqueue(&self, payload: IngestJobPayload) -> Result<(), JobQueueError> {
        {
            let mut pending = self.pending.lock().await;
            pending.insert(payload.job_id, payload);
        }

        self.sender.send(payload).map_err(|_| {
            // Undo the bookkeeping so size() stays truthful.
            let pending = self.pending.clone();
            let job_id = payload.job_id;
            tokio::spawn(async move {
                pending.lock().await.remove(&job_id);
            });
            JobQueueError::QueueClosed
        })?;

        Ok(())
    }

    async fn size(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// Receiving half handed to the worker pool. Safe to share between workers:
/// the inner receiver is locked only for the duration of one `recv`.
pub struct MpscJobQueueReceiver {
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<IngestJobPayload>>>,
    pending: Arc<Mutex<HashMap<Uuid, IngestJobPayload>>>,
}

impl MpscJobQueueReceiver {
    pub async fn recv(&self) -> Option<IngestJobPayload> {
        let payload = {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        };

        if let Some(payload) = payload {
            let mut pending = self.pending.lock().await;
            pending.remove(&payload.job_id);
        }

        payload
    }
}
