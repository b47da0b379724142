use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{ContentHash, ProcessingStatus};

/// An uploaded document. Created on first upload of a given content hash;
/// only the ingestion pipeline mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: Uuid,
    filename: String,
    content_hash: ContentHash,
    mime_type: String,
    storage_path: String,
    text_path: Option<String>,
    status: ProcessingStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        id: Uuid,
        filename: String,
        content_hash: ContentHash,
        mime_type: String,
        storage_path: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            filename,
            content_hash,
            mime_type,
            storage_path,
            text_path: None,
            status: ProcessingStatus::Queued,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild from persisted column values.
    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        filename: String,
        content_hash: ContentHash,
        mime_type: String,
        storage_path: String,
        text_path: Option<String>,
        status: ProcessingStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            filename,
            content_hash,
            mime_type,
            storage_path,
            text_path,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn storage_path(&self) -> &str {
        &self.storage_path
    }

    pub fn text_path(&self) -> Option<&str> {
        self.text_path.as_deref()
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProcessingStatus::Completed
    }

    pub fn set_text_path(&mut self, text_path: String) {
        self.text_path = Some(text_path);
        self.updated_at = Utc::now();
    }

    pub fn transition_to(&mut self, next: ProcessingStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Document {} cannot move from {} to {}",
                self.id, self.status, next
            ));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Document {
        Document::new(
            Uuid::new_v4(),
            "report.pdf".to_string(),
            ContentHash::from_bytes(b"report bytes"),
            "application/pdf".to_string(),
            "/storage/uploads/report.pdf".to_string(),
        )
    }

    #[test]
    fn test_new_document_is_queued() {
        let doc = sample_document();
        assert_eq!(doc.status(), ProcessingStatus::Queued);
        assert_eq!(doc.filename(), "report.pdf");
        assert!(doc.text_path().is_none());
        assert!(!doc.is_completed());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut doc = sample_document();
        doc.transition_to(ProcessingStatus::Processing).unwrap();
        doc.transition_to(ProcessingStatus::Completed).unwrap();
        assert!(doc.is_completed());
    }

    #[test]
    fn test_invalid_transition_is_rejected() {
        let mut doc = sample_document();
        assert!(doc.transition_to(ProcessingStatus::Completed).is_err());
        assert_eq!(doc.status(), ProcessingStatus::Queued);
    }
}
