pub mod completeness;
pub mod enrichment;
pub mod external_enrichment;
pub mod ingestion_pipeline;
pub mod intake;
pub mod query_orchestrator;
pub mod retrieval;
pub mod segmenter;

pub use completeness::CompletenessGrader;
pub use external_enrichment::ExternalEnrichment;
pub use ingestion_pipeline::IngestionPipeline;
pub use intake::{IntakeOutcome, IntakeService};
pub use query_orchestrator::{QueryOrchestrator, QueryPolicy};
pub use retrieval::RetrievalService;
pub use segmenter::TextSegmenter;
