use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Citation, QueryRun};

#[derive(Debug, Deserialize)]
pub struct QueryRequestDto {
    pub question: String,
    pub top_k: Option<i64>,
    pub document_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentQueryRequestDto {
    pub question: String,
    pub top_k: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct QueryRunResponseDto {
    pub query_id: Uuid,
    pub answer: String,
    pub confidence: f64,
    pub missing_info: Vec<String>,
    pub enrichment_suggestions: Vec<String>,
    pub used_external: bool,
    pub citations: Vec<Citation>,
}

impl From<QueryRun> for QueryRunResponseDto {
    fn from(run: QueryRun) -> Self {
        Self {
            query_id: run.id,
            answer: run.answer,
            confidence: run.confidence,
            missing_info: run.missing_info,
            enrichment_suggestions: run.enrichment_suggestions,
            used_external: run.used_external,
            citations: run.citations,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequestDto {
    pub query_id: Uuid,
    pub rating: i32,
    pub is_helpful: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponseDto {
    pub feedback_id: Uuid,
    pub query_id: Uuid,
}
