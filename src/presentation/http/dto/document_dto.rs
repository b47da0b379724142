use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::IntakeOutcome;
use crate::domain::entities::{Document, IngestionJob};

#[derive(Debug, Serialize)]
pub struct DocumentSummaryDto {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub status: String,
    pub created_at: String,
}

impl From<&Document> for DocumentSummaryDto {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id(),
            filename: document.filename().to_string(),
            mime_type: document.mime_type().to_string(),
            status: document.status().as_str().to_string(),
            created_at: document.created_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentDetailDto {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub status: String,
    pub storage_path: String,
    pub text_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Document> for DocumentDetailDto {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id(),
            filename: document.filename().to_string(),
            mime_type: document.mime_type().to_string(),
            status: document.status().as_str().to_string(),
            storage_path: document.storage_path().to_string(),
            text_path: document.text_path().map(String::from),
            created_at: document.created_at().to_rfc3339(),
            updated_at: document.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListDocumentsDto {
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

fn default_list_limit() -> i64 {
    200
}

#[derive(Debug, Serialize)]
pub struct UploadResponseDto {
    pub document_id: Uuid,
    pub job_id: Option<Uuid>,
    pub status: String,
    pub deduplicated: bool,
}

impl From<&IntakeOutcome> for UploadResponseDto {
    fn from(outcome: &IntakeOutcome) -> Self {
        Self {
            document_id: outcome.document.id(),
            job_id: outcome.job.as_ref().map(|j| j.id()),
            status: outcome.document.status().as_str().to_string(),
            deduplicated: outcome.deduplicated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobStatusDto {
    pub job_id: Uuid,
    pub document_id: Uuid,
    pub status: String,
    pub progress: i32,
    pub stage: String,
    pub error: Option<String>,
}

impl From<&IngestionJob> for JobStatusDto {
    fn from(job: &IngestionJob) -> Self {
        Self {
            job_id: job.id(),
            document_id: job.document_id(),
            status: job.status().as_str().to_string(),
            progress: job.progress(),
            stage: job.stage().as_str().to_string(),
            error: job.error_message().map(String::from),
        }
    }
}
