pub mod postgres_chunk_repository;
pub mod postgres_document_repository;
pub mod postgres_job_repository;
pub mod postgres_query_run_repository;

pub use postgres_chunk_repository::PostgresChunkRepository;
pub use postgres_document_repository::PostgresDocumentRepository;
pub use postgres_job_repository::PostgresJobRepository;
pub use postgres_query_run_repository::PostgresQueryRunRepository;
