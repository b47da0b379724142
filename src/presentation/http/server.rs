use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::infrastructure::messaging::IngestWorkerPool;
use crate::presentation::http::{
    handlers::{DocumentHandler, QueryHandler},
    routes::{document_routes, health_routes, query_routes},
};

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub struct HttpServer {
    document_handler: Arc<DocumentHandler>,
    query_handler: Arc<QueryHandler>,
    worker_pool: Arc<IngestWorkerPool>,
    port: u16,
}

impl HttpServer {
    pub fn new(
        document_handler: Arc<DocumentHandler>,
        query_handler: Arc<QueryHandler>,
        worker_pool: Arc<IngestWorkerPool>,
        port: u16,
    ) -> Self {
        Self {
            document_handler,
            query_handler,
            worker_pool,
            port,
        }
    }

    /// Axum ships its own 2 MB body limit that the multipart extractor
    /// consults independently of tower-http's layer, so both must be
    /// raised to accept full-size uploads.
    fn with_body_limits(router: Router) -> Router {
        router
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
            .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        // Workers outlive any single request; they stop when the queue closes.
        let worker_pool = self.worker_pool.clone();
        tokio::spawn(async move {
            worker_pool.start().await;
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = Self::with_body_limits(
            Router::new()
                .merge(health_routes())
                .merge(document_routes(self.document_handler))
                .merge(query_routes(self.query_handler)),
        )
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .on_request(
                    |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                        tracing::info!(
                            "Received request: {} {}",
                            request.method(),
                            request.uri()
                        );
                    },
                )
                .on_response(
                    |response: &axum::http::Response<axum::body::Body>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            "Response: {} (took {} ms)",
                            response.status(),
                            latency.as_millis()
                        );
                    },
                )
                .on_failure(
                    |error: ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::error!(
                            "Request failed: {:?} (took {} ms)",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        );

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        tracing::info!("Listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use std::sync::Mutex;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::application::ports::{
        FileStorage, FileStorageError, IngestJobPayload, JobQueue, JobQueueError,
    };
    use crate::application::services::IntakeService;
    use crate::domain::entities::{Document, IngestionJob};
    use crate::domain::repositories::{
        DocumentRepository, DocumentRepositoryError, JobRepository, JobRepositoryError, JobUpdate,
    };
    use crate::domain::value_objects::{ContentHash, ProcessingStatus};

    struct StubDocumentRepo;

    #[async_trait]
    impl DocumentRepository for StubDocumentRepo {
        async fn insert(&self, _document: &Document) -> Result<(), DocumentRepositoryError> {
            Ok(())
        }

        async fn find_by_id(
            &self,
            _id: Uuid,
        ) -> Result<Option<Document>, DocumentRepositoryError> {
            Ok(None)
        }

        async fn find_by_hash(
            &self,
            _hash: &ContentHash,
        ) -> Result<Option<Document>, DocumentRepositoryError> {
            Ok(None)
        }

        async fn list_recent(
            &self,
            _limit: i64,
        ) -> Result<Vec<Document>, DocumentRepositoryError> {
            Ok(vec![])
        }

        async fn set_status(
            &self,
            _id: Uuid,
            _status: ProcessingStatus,
        ) -> Result<(), DocumentRepositoryError> {
            Ok(())
        }

        async fn set_text_path(
            &self,
            _id: Uuid,
            _text_path: &str,
        ) -> Result<(), DocumentRepositoryError> {
            Ok(())
        }
    }

    struct StubJobRepo;

    #[async_trait]
    impl JobRepository for StubJobRepo {
        async fn insert(&self, _job: &IngestionJob) -> Result<(), JobRepositoryError> {
            Ok(())
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError> {
            Ok(None)
        }

        async fn update(&self, _id: Uuid, _update: JobUpdate) -> Result<(), JobRepositoryError> {
            Ok(())
        }
    }

    struct StubStorage;

    #[async_trait]
    impl FileStorage for StubStorage {
        async fn save_upload(
            &self,
            document_id: Uuid,
            original_name: &str,
            _data: &[u8],
        ) -> Result<String, FileStorageError> {
            Ok(format!("uploads/{}_{}", document_id, original_name))
        }

        async fn save_extracted_text(
            &self,
            document_id: Uuid,
            _text: &str,
        ) -> Result<String, FileStorageError> {
            Ok(format!("text/{}.txt", document_id))
        }
    }

    struct StubQueue {
        enqueued: Mutex<Vec<IngestJobPayload>>,
    }

    #[async_trait]
    impl JobQueue for StubQueue {
        async fn enqueue(&self, payload: IngestJobPayload) -> Result<(), JobQueueError> {
            self.enqueued.lock().unwrap().push(payload);
            Ok(())
        }

        async fn size(&self) -> usize {
            self.enqueued.lock().unwrap().len()
        }
    }

    fn upload_router() -> Router {
        let intake = Arc::new(IntakeService::new(
            Arc::new(StubDocumentRepo),
            Arc::new(StubJobRepo),
            Arc::new(StubStorage),
            Arc::new(StubQueue {
                enqueued: Mutex::new(vec![]),
            }),
        ));
        let handler = Arc::new(DocumentHandler::new(
            intake,
            Arc::new(StubDocumentRepo),
            Arc::new(StubJobRepo),
        ));
        HttpServer::with_body_limits(document_routes(handler))
    }

    fn multipart_upload(size: usize) -> Request<Body> {
        let boundary = "upload-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"big.txt\"\r\nContent-Type: text/plain\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&vec![b'a'; size]);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/documents")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_above_two_megabytes_is_accepted() {
        let app = upload_router();

        let response = app
            .oneshot(multipart_upload(3 * 1024 * 1024))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_upload_above_cap_is_rejected() {
        let app = upload_router();

        let response = app
            .oneshot(multipart_upload(MAX_UPLOAD_BYTES + 1))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
