use axum::{Router, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::QueryHandler;

pub fn query_routes(query_handler: Arc<QueryHandler>) -> Router {
    Router::new()
        .route("/query", post(QueryHandler::ask))
        .route(
            "/query/documents/{document_id}",
            post(QueryHandler::ask_document),
        )
        .route("/feedback", post(QueryHandler::submit_feedback))
        .with_state(query_handler)
}
