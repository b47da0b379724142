pub mod chunk_model;
pub mod document_model;
pub mod job_model;
pub mod query_run_model;

pub use chunk_model::{ChunkHitRow, NewChunkModel};
pub use document_model::{DocumentModel, NewDocumentModel};
pub use job_model::{IngestionJobModel, JobChangeset, NewIngestionJobModel};
pub use query_run_model::{NewFeedbackModel, NewQueryRunModel};
