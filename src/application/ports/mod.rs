pub mod completion_provider;
pub mod embedding_provider;
pub mod file_storage;
pub mod job_queue;
pub mod knowledge_source;
pub mod text_extractor;

pub use completion_provider::{CompletionProvider, CompletionProviderError};
pub use embedding_provider::{EmbeddingProvider, EmbeddingProviderError};
pub use file_storage::{FileStorage, FileStorageError};
pub use job_queue::{IngestJobPayload, JobQueue, JobQueueError};
pub use knowledge_source::{KnowledgeSource, KnowledgeSourceError};
pub use text_extractor::{TextExtractionError, TextExtractor};
