use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::{Feedback, QueryRun};
use crate::domain::repositories::QueryRunRepositoryError;
use crate::infrastructure::database::schema::{feedback, query_runs};

#[derive(Debug, Insertable)]
#[diesel(table_name = query_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewQueryRunModel {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub confidence: f64,
    pub missing_info: Vec<String>,
    pub enrichment_suggestions: Vec<String>,
    pub citations: serde_json::Value,
    pub used_external: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&QueryRun> for NewQueryRunModel {
    type Error = QueryRunRepositoryError;

    fn try_from(run: &QueryRun) -> Result<Self, Self::Error> {
        let citations = serde_json::to_value(&run.citations)
            .map_err(|e| QueryRunRepositoryError::DatabaseError(e.to_string()))?;
        Ok(Self {
            id: run.id,
            question: run.question.clone(),
            answer: run.answer.clone(),
            confidence: run.confidence,
            missing_info: run.missing_info.clone(),
            enrichment_suggestions: run.enrichment_suggestions.clone(),
            citations,
            used_external: run.used_external,
            created_at: run.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = feedback)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewFeedbackModel {
    pub id: Uuid,
    pub query_run_id: Uuid,
    pub rating: i32,
    pub is_helpful: bool,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Feedback> for NewFeedbackModel {
    fn from(entry: &Feedback) -> Self {
        Self {
            id: entry.id,
            query_run_id: entry.query_run_id,
            rating: entry.rating,
            is_helpful: entry.is_helpful,
            comment: entry.comment.clone(),
            created_at: entry.created_at,
        }
    }
}
