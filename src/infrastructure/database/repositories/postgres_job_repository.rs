use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::IngestionJob;
use crate::domain::repositories::{JobRepository, JobRepositoryError, JobUpdate};
use crate::infrastructure::database::models::{
    IngestionJobModel, JobChangeset, NewIngestionJobModel,
};
use crate::infrastructure::database::schema::ingestion_jobs;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresJobRepository {
    pool: DbPool,
}

impl PostgresJobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn insert(&self, job: &IngestionJob) -> Result<(), JobRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| JobRepositoryError::DatabaseError(e.to_string()))?;

        diesel::insert_into(ingestion_jobs::table)
            .values(NewIngestionJobModel::from(job))
            .execute(&mut conn)
            .map_err(|e| JobRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| JobRepositoryError::DatabaseError(e.to_string()))?;

        let model = ingestion_jobs::table
            .find(id)
            .first::<IngestionJobModel>(&mut conn)
            .optional()
            .map_err(|e| JobRepositoryError::DatabaseError(e.to_string()))?;

        model.map(IngestionJob::try_from).transpose()
    }

    async fn update(&self, id: Uuid, update: JobUpdate) -> Result<(), JobRepositoryError> {
        if update.is_empty() {
            return Ok(());
        }

        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| JobRepositoryError::DatabaseError(e.to_string()))?;

        diesel::update(ingestion_jobs::table.find(id))
            .set(JobChangeset::from(update))
            .execute(&mut conn)
            .map_err(|e| JobRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
