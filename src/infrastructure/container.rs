use std::{path::PathBuf, sync::Arc};

use crate::{
    application::{
        ports::{CompletionProvider, EmbeddingProvider, FileStorage, JobQueue, TextExtractor},
        services::{
            CompletenessGrader, ExternalEnrichment, IngestionPipeline, IntakeService,
            QueryOrchestrator, QueryPolicy, RetrievalService, TextSegmenter,
        },
    },
    config::AppConfig,
    domain::{
        repositories::{ChunkRepository, DocumentRepository, JobRepository, QueryRunRepository},
        value_objects::TrustedDomains,
    },
    infrastructure::{
        database::{
            create_connection_pool, get_connection_from_pool,
            repositories::{
                PostgresChunkRepository, PostgresDocumentRepository, PostgresJobRepository,
                PostgresQueryRunRepository,
            },
            run_migrations,
        },
        external_services::{
            OpenAiClient, OpenAiClientConfig, WikipediaClient,
            document_extractors::CompositeExtractor,
        },
        file_system::LocalFileStorage,
        messaging::{IngestWorkerPool, MpscJobQueue},
    },
};

pub struct AppContainer {
    pub config: AppConfig,

    // Repositories
    pub documents: Arc<dyn DocumentRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub chunks: Arc<dyn ChunkRepository>,
    pub query_runs: Arc<dyn QueryRunRepository>,

    // Queue and worker pool
    pub job_queue: Arc<dyn JobQueue>,
    pub worker_pool: Arc<IngestWorkerPool>,

    // Application services
    pub intake: Arc<IntakeService>,
    pub orchestrator: Arc<QueryOrchestrator>,
}

impl AppContainer {
    pub async fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = create_connection_pool(&config.database_url)?;
        let mut conn = get_connection_from_pool(&pool)?;
        run_migrations(&mut conn)?;
        drop(conn);

        // Repositories
        let documents: Arc<dyn DocumentRepository> =
            Arc::new(PostgresDocumentRepository::new(pool.clone()));
        let jobs: Arc<dyn JobRepository> = Arc::new(PostgresJobRepository::new(pool.clone()));
        let chunks: Arc<dyn ChunkRepository> = Arc::new(PostgresChunkRepository::new(pool.clone()));
        let query_runs: Arc<dyn QueryRunRepository> =
            Arc::new(PostgresQueryRunRepository::new(pool));

        // External services
        let openai = Arc::new(OpenAiClient::new(OpenAiClientConfig::from_app_config(
            &config,
        ))?);
        let embeddings: Arc<dyn EmbeddingProvider> = openai.clone();
        let completions: Arc<dyn CompletionProvider> = openai;

        let storage: Arc<dyn FileStorage> =
            Arc::new(LocalFileStorage::new(PathBuf::from(&config.storage_dir)));
        let extractor: Arc<dyn TextExtractor> =
            Arc::new(CompositeExtractor::new(config.ocr.clone()));

        // Ingestion side
        let (queue, queue_receiver) = MpscJobQueue::create_pair();
        let job_queue: Arc<dyn JobQueue> = Arc::new(queue);

        let pipeline = Arc::new(IngestionPipeline::new(
            documents.clone(),
            jobs.clone(),
            chunks.clone(),
            extractor,
            embeddings.clone(),
            storage.clone(),
            TextSegmenter::default(),
        ));
        let worker_pool = Arc::new(IngestWorkerPool::new(
            Arc::new(queue_receiver),
            pipeline,
            config.ingest_workers,
            config.job_max_attempts,
            config.job_backoff_ms,
        ));

        let intake = Arc::new(IntakeService::new(
            documents.clone(),
            jobs.clone(),
            storage,
            job_queue.clone(),
        ));

        // Query side
        let retrieval = Arc::new(RetrievalService::new(embeddings, chunks.clone()));
        let grader = Arc::new(CompletenessGrader::new(completions.clone()));
        let enrichment = Arc::new(ExternalEnrichment::new(
            Arc::new(WikipediaClient::new()?),
            TrustedDomains::from_csv(&config.trusted_domains),
            config.max_external_snippets,
        ));
        let orchestrator = Arc::new(QueryOrchestrator::new(
            retrieval,
            completions,
            grader,
            enrichment,
            query_runs.clone(),
            QueryPolicy {
                external_confidence_cap: config.external_confidence_cap,
                enrich_confidence_threshold: config.enrich_confidence_threshold,
            },
        ));

        Ok(Self {
            config,
            documents,
            jobs,
            chunks,
            query_runs,
            job_queue,
            worker_pool,
            intake,
            orchestrator,
        })
    }
}
