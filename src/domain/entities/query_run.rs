use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationSource {
    DocChunk,
    External,
}

/// Provenance attached to an answer. Validated before persistence: the
/// excerpt is capped at 220 characters and required, uuid fields are kept
/// only when syntactically valid, url/title only when non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub source_type: CitationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub excerpt: String,
}

/// One answered question, persisted as an immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRun {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub confidence: f64,
    pub missing_info: Vec<String>,
    pub enrichment_suggestions: Vec<String>,
    pub used_external: bool,
    pub citations: Vec<Citation>,
    pub created_at: DateTime<Utc>,
}

impl QueryRun {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        question: String,
        answer: String,
        confidence: f64,
        missing_info: Vec<String>,
        enrichment_suggestions: Vec<String>,
        used_external: bool,
        citations: Vec<Citation>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question,
            answer,
            confidence,
            missing_info,
            enrichment_suggestions,
            used_external,
            citations,
            created_at: Utc::now(),
        }
    }
}

/// Feedback left against a persisted query run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub query_run_id: Uuid,
    pub rating: i32,
    pub is_helpful: bool,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    pub fn new(query_run_id: Uuid, rating: i32, is_helpful: bool, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query_run_id,
            rating,
            is_helpful,
            comment,
            created_at: Utc::now(),
        }
    }
}
