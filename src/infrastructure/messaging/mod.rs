pub mod ingest_worker_pool;
pub mod mpsc_job_queue;

pub use ingest_worker_pool::IngestWorkerPool;
pub use mpsc_job_queue::{MpscJobQueue, MpscJobQueueReceiver};
