pub mod chunk_repository;
pub mod document_repository;
pub mod job_repository;
pub mod query_run_repository;

pub use chunk_repository::{ChunkRepository, ChunkRepositoryError};
pub use document_repository::{DocumentRepository, DocumentRepositoryError};
pub use job_repository::{JobRepository, JobRepositoryError, JobUpdate};
pub use query_run_repository::{QueryRunRepository, QueryRunRepositoryError};
