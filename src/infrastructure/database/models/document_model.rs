use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::repositories::DocumentRepositoryError;
use crate::domain::value_objects::{ContentHash, ProcessingStatus};
use crate::infrastructure::database::schema::documents;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentModel {
    pub id: Uuid,
    pub filename: String,
    pub content_hash: String,
    pub mime_type: String,
    pub storage_path: String,
    pub text_path: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDocumentModel {
    pub id: Uuid,
    pub filename: String,
    pub content_hash: String,
    pub mime_type: String,
    pub storage_path: String,
    pub text_path: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Document> for NewDocumentModel {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id(),
            filename: document.filename().to_string(),
            content_hash: document.content_hash().to_string(),
            mime_type: document.mime_type().to_string(),
            storage_path: document.storage_path().to_string(),
            text_path: document.text_path().map(|p| p.to_string()),
            status: document.status().as_str().to_string(),
            created_at: document.created_at(),
            updated_at: document.updated_at(),
        }
    }
}

impl TryFrom<DocumentModel> for Document {
    type Error = DocumentRepositoryError;

    fn try_from(model: DocumentModel) -> Result<Self, Self::Error> {
        let content_hash =
            ContentHash::new(model.content_hash).map_err(DocumentRepositoryError::InvalidRecord)?;
        let status =
            ProcessingStatus::parse(&model.status).map_err(DocumentRepositoryError::InvalidRecord)?;
        Ok(Document::from_database(
            model.id,
            model.filename,
            content_hash,
            model.mime_type,
            model.storage_path,
            model.text_path,
            status,
            model.created_at,
            model.updated_at,
        ))
    }
}
