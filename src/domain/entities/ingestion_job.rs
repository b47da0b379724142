use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{IngestionStage, ProcessingStatus};

/// One attempt at driving a document through the ingestion pipeline.
/// The stage sequence is strictly linear; progress never decreases while
/// the job is processing. Several jobs may reference the same document
/// across retries, but only one is active at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionJob {
    id: Uuid,
    document_id: Uuid,
    status: ProcessingStatus,
    progress: i32,
    stage: IngestionStage,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IngestionJob {
    pub fn new(document_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            document_id,
            status: ProcessingStatus::Queued,
            progress: 0,
            stage: IngestionStage::Uploaded,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild from persisted column values.
    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        document_id: Uuid,
        status: ProcessingStatus,
        progress: i32,
        stage: IngestionStage,
        error_message: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            document_id,
            status,
            progress,
            stage,
            error_message,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn progress(&self) -> i32 {
        self.progress
    }

    pub fn stage(&self) -> IngestionStage {
        self.stage
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Enter the processing state at the first stage checkpoint.
    pub fn begin(&mut self) -> Result<(), String> {
        if !self.status.can_transition_to(ProcessingStatus::Processing) {
            return Err(format!("Job {} is not startable from {}", self.id, self.status));
        }
        self.status = ProcessingStatus::Processing;
        self.stage = IngestionStage::Uploaded;
        self.progress = IngestionStage::Uploaded.progress();
        self.error_message = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Move to the given stage. Only the immediate successor of the current
    /// stage is accepted; skipping or revisiting stages is a bug.
    pub fn advance_to(&mut self, stage: IngestionStage) -> Result<(), String> {
        if self.status != ProcessingStatus::Processing {
            return Err(format!("Job {} is not processing", self.id));
        }
        if self.stage.next() != Some(stage) {
            return Err(format!(
                "Job {} cannot advance from {} to {}",
                self.id, self.stage, stage
            ));
        }
        self.stage = stage;
        self.progress = self.progress.max(stage.progress());
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), String> {
        self.advance_to(IngestionStage::Completed)?;
        self.status = ProcessingStatus::Completed;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record a failure. Progress stays at the last recorded checkpoint.
    pub fn fail(&mut self, error: String) -> Result<(), String> {
        if !self.status.can_transition_to(ProcessingStatus::Failed) {
            return Err(format!("Job {} cannot fail from {}", self.id, self.status));
        }
        self.status = ProcessingStatus::Failed;
        self.error_message = Some(error);
        self.updated_at = Utc::now();
        Ok(())
    }
}
