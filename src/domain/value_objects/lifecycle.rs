use serde::{Deserialize, Serialize};

/// Coarse lifecycle shared by documents and ingestion jobs. Failure details
/// live in the owning record's error_message column, not in the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }

    pub fn can_transition_to(&self, next: ProcessingStatus) -> bool {
        matches!(
            (self, next),
            (ProcessingStatus::Queued, ProcessingStatus::Processing)
                | (ProcessingStatus::Processing, ProcessingStatus::Completed)
                | (ProcessingStatus::Processing, ProcessingStatus::Failed)
                // A queued record can fail before work starts (e.g. enqueue errors).
                | (ProcessingStatus::Queued, ProcessingStatus::Failed)
                // Retries re-enter the pipeline from the top.
                | (ProcessingStatus::Failed, ProcessingStatus::Processing)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Queued => "queued",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "queued" => Ok(ProcessingStatus::Queued),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed),
            other => Err(format!("Invalid processing status: {}", other)),
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Checkpoints of the linear ingestion pipeline, finer-grained than the
/// coarse status. A job only ever moves forward through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestionStage {
    Uploaded,
    TextExtracted,
    Chunked,
    EmbeddingCreated,
    Indexed,
    Completed,
}

impl IngestionStage {
    /// The stage that follows this one, or None at the end of the line.
    pub fn next(&self) -> Option<IngestionStage> {
        match self {
            IngestionStage::Uploaded => Some(IngestionStage::TextExtracted),
            IngestionStage::TextExtracted => Some(IngestionStage::Chunked),
            IngestionStage::Chunked => Some(IngestionStage::EmbeddingCreated),
            IngestionStage::EmbeddingCreated => Some(IngestionStage::Indexed),
            IngestionStage::Indexed => Some(IngestionStage::Completed),
            IngestionStage::Completed => None,
        }
    }

    /// Progress checkpoint recorded when this stage is reached.
    pub fn progress(&self) -> i32 {
        match self {
            IngestionStage::Uploaded => 5,
            IngestionStage::TextExtracted => 20,
            IngestionStage::Chunked => 40,
            IngestionStage::EmbeddingCreated => 70,
            IngestionStage::Indexed => 90,
            IngestionStage::Completed => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStage::Uploaded => "UPLOADED",
            IngestionStage::TextExtracted => "TEXT_EXTRACTED",
            IngestionStage::Chunked => "CHUNKED",
            IngestionStage::EmbeddingCreated => "EMBEDDING_CREATED",
            IngestionStage::Indexed => "INDEXED",
            IngestionStage::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "UPLOADED" => Ok(IngestionStage::Uploaded),
            "TEXT_EXTRACTED" => Ok(IngestionStage::TextExtracted),
            "CHUNKED" => Ok(IngestionStage::Chunked),
            "EMBEDDING_CREATED" => Ok(IngestionStage::EmbeddingCreated),
            "INDEXED" => Ok(IngestionStage::Indexed),
            "COMPLETED" => Ok(IngestionStage::Completed),
            other => Err(format!("Invalid ingestion stage: {}", other)),
        }
    }
}

impl std::fmt::Display for IngestionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
