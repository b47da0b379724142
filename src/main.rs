mod application;
mod config;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use config::AppConfig;
use infrastructure::AppContainer;
use presentation::HttpServer;
use presentation::http::handlers::{DocumentHandler, QueryHandler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let port = config.port;

    let container = AppContainer::new(config).await?;

    let document_handler = Arc::new(DocumentHandler::new(
        container.intake.clone(),
        container.documents.clone(),
        container.jobs.clone(),
    ));
    let query_handler = Arc::new(QueryHandler::new(
        container.orchestrator.clone(),
        container.query_runs.clone(),
    ));

    HttpServer::new(
        document_handler,
        query_handler,
        container.worker_pool.clone(),
        port,
    )
    .run()
    .await
}
