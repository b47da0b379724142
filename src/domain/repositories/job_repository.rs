use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::IngestionJob;
use crate::domain::value_objects::{IngestionStage, ProcessingStatus};

#[derive(Debug)]
pub enum JobRepositoryError {
    DatabaseError(String),
    InvalidRecord(String),
}

impl std::fmt::Display for JobRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            JobRepositoryError::InvalidRecord(msg) => write!(f, "Invalid record: {}", msg),
        }
    }
}

impl std::error::Error for JobRepositoryError {}

/// Explicit set of changed job fields for a partial update. `error_message`
/// distinguishes "leave alone" (None) from "set to null" (Some(None)).
#[derive(Debug, Default, Clone)]
pub struct JobUpdate {
    pub status: Option<ProcessingStatus>,
    pub progress: Option<i32>,
    pub stage: Option<IngestionStage>,
    pub error_message: Option<Option<String>>,
}

impl JobUpdate {
    pub fn status(mut self, status: ProcessingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn progress(mut self, progress: i32) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn stage(mut self, stage: IngestionStage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn error_message(mut self, error: Option<String>) -> Self {
        self.error_message = Some(error);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.progress.is_none()
            && self.stage.is_none()
            && self.error_message.is_none()
    }

    /// Snapshot the fields of a job entity that stage transitions touch.
    pub fn from_job(job: &IngestionJob) -> Self {
        Self::default()
            .status(job.status())
            .progress(job.progress())
            .stage(job.stage())
            .error_message(job.error_message().map(|e| e.to_string()))
    }
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn insert(&self, job: &IngestionJob) -> Result<(), JobRepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError>;

    async fn update(&self, id: Uuid, update: JobUpdate) -> Result<(), JobRepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update() {
        assert!(JobUpdate::default().is_empty());
        assert!(!JobUpdate::default().progress(40).is_empty());
    }

    #[test]
    fn test_from_job_snapshots_all_fields() {
        let job = IngestionJob::new(Uuid::new_v4());
        let update = JobUpdate::from_job(&job);
        assert_eq!(update.status, Some(ProcessingStatus::Queued));
        assert_eq!(update.progress, Some(0));
        assert_eq!(update.stage, Some(IngestionStage::Uploaded));
        assert_eq!(update.error_message, Some(None));
    }
}
