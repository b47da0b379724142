pub mod chunk;
pub mod document;
pub mod external_snippet;
pub mod ingestion_job;
pub mod query_run;

pub use chunk::{DocumentChunk, RetrievedChunk};
pub use document::Document;
pub use external_snippet::ExternalSnippet;
pub use ingestion_job::IngestionJob;
pub use query_run::{Citation, CitationSource, Feedback, QueryRun};
