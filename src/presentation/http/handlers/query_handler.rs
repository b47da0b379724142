use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::QueryOrchestrator;
use crate::domain::entities::Feedback;
use crate::domain::repositories::QueryRunRepository;
use crate::presentation::http::dto::{
    ApiResponse, DocumentQueryRequestDto, FeedbackRequestDto, FeedbackResponseDto,
    QueryRequestDto, QueryRunResponseDto,
};

const MIN_QUESTION_CHARS: usize = 3;

pub struct QueryHandler {
    orchestrator: Arc<QueryOrchestrator>,
    runs: Arc<dyn QueryRunRepository>,
}

impl QueryHandler {
    pub fn new(orchestrator: Arc<QueryOrchestrator>, runs: Arc<dyn QueryRunRepository>) -> Self {
        Self { orchestrator, runs }
    }

    pub async fn ask(
        State(handler): State<Arc<QueryHandler>>,
        Json(request): Json<QueryRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        handler
            .run_query(
                &request.question,
                request.top_k,
                request.document_ids.as_deref(),
            )
            .await
    }

    pub async fn ask_document(
        State(handler): State<Arc<QueryHandler>>,
        Path(document_id): Path<Uuid>,
        Json(request): Json<DocumentQueryRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let scope = [document_id];
        handler
            .run_query(&request.question, request.top_k, Some(&scope))
            .await
    }

    async fn run_query(
        &self,
        question: &str,
        top_k: Option<i64>,
        document_ids: Option<&[Uuid]>,
    ) -> Result<(StatusCode, Json<ApiResponse<QueryRunResponseDto>>), StatusCode> {
        let question = question.trim();
        if question.chars().count() < MIN_QUESTION_CHARS {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "INVALID_QUESTION".to_string(),
                    format!("Question must be at least {} characters", MIN_QUESTION_CHARS),
                    None,
                )),
            ));
        }

        match self.orchestrator.ask(question, top_k, document_ids).await {
            Ok(run) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(QueryRunResponseDto::from(run))),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "QUERY_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }

    pub async fn submit_feedback(
        State(handler): State<Arc<QueryHandler>>,
        Json(request): Json<FeedbackRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        if !(1..=5).contains(&request.rating) {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "INVALID_RATING".to_string(),
                    "Rating must be between 1 and 5".to_string(),
                    None,
                )),
            ));
        }

        match handler.runs.exists(request.query_id).await {
            Ok(false) => {
                return Ok((
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error(
                        "QUERY_RUN_NOT_FOUND".to_string(),
                        format!("Query run not found: {}", request.query_id),
                        None,
                    )),
                ));
            }
            Err(e) => {
                return Ok((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(
                        "FEEDBACK_FAILED".to_string(),
                        e.to_string(),
                        None,
                    )),
                ));
            }
            Ok(true) => {}
        }

        let feedback = Feedback::new(
            request.query_id,
            request.rating,
            request.is_helpful,
            request.comment,
        );

        match handler.runs.insert_feedback(&feedback).await {
            Ok(()) => Ok((
                StatusCode::CREATED,
                Json(ApiResponse::success(FeedbackResponseDto {
                    feedback_id: feedback.id,
                    query_id: feedback.query_run_id,
                })),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "FEEDBACK_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }
}
