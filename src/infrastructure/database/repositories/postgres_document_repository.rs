use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::repositories::{DocumentRepository, DocumentRepositoryError};
use crate::domain::value_objects::{ContentHash, ProcessingStatus};
use crate::infrastructure::database::models::{DocumentModel, NewDocumentModel};
use crate::infrastructure::database::schema::documents;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresDocumentRepository {
    pool: DbPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn insert(&self, document: &Document) -> Result<(), DocumentRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        diesel::insert_into(documents::table)
            .values(NewDocumentModel::from(document))
            .execute(&mut conn)
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, DocumentRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        let model = documents::table
            .find(id)
            .first::<DocumentModel>(&mut conn)
            .optional()
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        model.map(Document::try_from).transpose()
    }

    async fn find_by_hash(
        &self,
        hash: &ContentHash,
    ) -> Result<Option<Document>, DocumentRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        let model = documents::table
            .filter(documents::content_hash.eq(hash.as_str()))
            .first::<DocumentModel>(&mut conn)
            .optional()
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        model.map(Document::try_from).transpose()
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Document>, DocumentRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        let models = documents::table
            .order(documents::created_at.desc())
            .limit(limit)
            .load::<DocumentModel>(&mut conn)
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        models.into_iter().map(Document::try_from).collect()
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ProcessingStatus,
    ) -> Result<(), DocumentRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        diesel::update(documents::table.find(id))
            .set((
                documents::status.eq(status.as_str()),
                documents::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn set_text_path(&self, id: Uuid, text_path: &str) -> Result<(), DocumentRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        diesel::update(documents::table.find(id))
            .set((
                documents::text_path.eq(text_path),
                documents::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
