use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::IngestionJob;
use crate::domain::repositories::{JobRepositoryError, JobUpdate};
use crate::domain::value_objects::{IngestionStage, ProcessingStatus};
use crate::infrastructure::database::schema::ingestion_jobs;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = ingestion_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IngestionJobModel {
    pub id: Uuid,
    pub document_id: Uuid,
    pub status: String,
    pub progress: i32,
    pub stage: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ingestion_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewIngestionJobModel {
    pub id: Uuid,
    pub document_id: Uuid,
    pub status: String,
    pub progress: i32,
    pub stage: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changed-fields changeset for partial job updates. The double Option on
/// `error_message` lets one update distinguish "leave alone" from
/// "set to null".
#[derive(Debug, AsChangeset)]
#[diesel(table_name = ingestion_jobs)]
pub struct JobChangeset {
    pub status: Option<String>,
    pub progress: Option<i32>,
    pub stage: Option<String>,
    pub error_message: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl From<&IngestionJob> for NewIngestionJobModel {
    fn from(job: &IngestionJob) -> Self {
        Self {
            id: job.id(),
            document_id: job.document_id(),
            status: job.status().as_str().to_string(),
            progress: job.progress(),
            stage: job.stage().as_str().to_string(),
            error_message: job.error_message().map(|e| e.to_string()),
            created_at: job.created_at(),
            updated_at: job.updated_at(),
        }
    }
}

impl From<JobUpdate> for JobChangeset {
    fn from(update: JobUpdate) -> Self {
        Self {
            status: update.status.map(|s| s.as_str().to_string()),
            progress: update.progress,
            stage: update.stage.map(|s| s.as_str().to_string()),
            error_message: update.error_message,
            updated_at: Utc::now(),
        }
    }
}

impl TryFrom<IngestionJobModel> for IngestionJob {
    type Error = JobRepositoryError;

    fn try_from(model: IngestionJobModel) -> Result<Self, Self::Error> {
        let status =
            ProcessingStatus::parse(&model.status).map_err(JobRepositoryError::InvalidRecord)?;
        let stage = IngestionStage::parse(&model.stage).map_err(JobRepositoryError::InvalidRecord)?;
        Ok(IngestionJob::from_database(
            model.id,
            model.document_id,
            status,
            model.progress,
            stage,
            model.error_message,
            model.created_at,
            model.updated_at,
        ))
    }
}
