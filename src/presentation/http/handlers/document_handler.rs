use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::IntakeService;
use crate::domain::repositories::{DocumentRepository, JobRepository};
use crate::presentation::http::dto::{
    ApiResponse, DocumentDetailDto, DocumentSummaryDto, JobStatusDto, ListDocumentsDto,
    UploadResponseDto,
};

const MAX_LIST_LIMIT: i64 = 200;
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

pub struct DocumentHandler {
    intake: Arc<IntakeService>,
    documents: Arc<dyn DocumentRepository>,
    jobs: Arc<dyn JobRepository>,
}

impl DocumentHandler {
    pub fn new(
        intake: Arc<IntakeService>,
        documents: Arc<dyn DocumentRepository>,
        jobs: Arc<dyn JobRepository>,
    ) -> Self {
        Self {
            intake,
            documents,
            jobs,
        }
    }

    pub async fn upload_document(
        State(handler): State<Arc<DocumentHandler>>,
        mut multipart: Multipart,
    ) -> Result<impl IntoResponse, StatusCode> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?
        {
            if field.name() != Some("file") {
                continue;
            }

            let filename = field
                .file_name()
                .ok_or(StatusCode::BAD_REQUEST)?
                .to_string();
            let mime_type = field
                .content_type()
                .map(|ct| ct.to_string())
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|_| StatusCode::BAD_REQUEST)?
                .to_vec();

            if data.is_empty() {
                return Ok((
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(
                        "EMPTY_FILE".to_string(),
                        "Uploaded file is empty".to_string(),
                        None,
                    )),
                ));
            }

            return match handler.intake.admit(&filename, &mime_type, &data).await {
                Ok(outcome) => {
                    let status = if outcome.deduplicated && outcome.job.is_none() {
                        StatusCode::OK
                    } else {
                        StatusCode::CREATED
                    };
                    let dto = UploadResponseDto::from(&outcome);
                    Ok((status, Json(ApiResponse::success(dto))))
                }
                Err(e) => Ok((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(
                        "UPLOAD_FAILED".to_string(),
                        e.to_string(),
                        None,
                    )),
                )),
            };
        }

        Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "NO_FILE_PROVIDED".to_string(),
                "Multipart request must carry a 'file' field".to_string(),
                None,
            )),
        ))
    }

    pub async fn list_documents(
        State(handler): State<Arc<DocumentHandler>>,
        Query(params): Query<ListDocumentsDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let limit = params.limit.clamp(1, MAX_LIST_LIMIT);

        match handler.documents.list_recent(limit).await {
            Ok(documents) => {
                let dtos: Vec<DocumentSummaryDto> =
                    documents.iter().map(DocumentSummaryDto::from).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dtos))))
            }
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "LIST_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }

    pub async fn get_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.documents.find_by_id(document_id).await {
            Ok(Some(document)) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(DocumentDetailDto::from(&document))),
            )),
            Ok(None) => Ok((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error(
                    "DOCUMENT_NOT_FOUND".to_string(),
                    format!("Document not found: {}", document_id),
                    None,
                )),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "LOOKUP_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }

    pub async fn get_job_status(
        State(handler): State<Arc<DocumentHandler>>,
        Path(job_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.jobs.find_by_id(job_id).await {
            Ok(Some(job)) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(JobStatusDto::from(&job))),
            )),
            Ok(None) => Ok((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error(
                    "JOB_NOT_FOUND".to_string(),
                    format!("Job not found: {}", job_id),
                    None,
                )),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "LOOKUP_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }
}
