use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::{Feedback, QueryRun};
use crate::domain::repositories::{QueryRunRepository, QueryRunRepositoryError};
use crate::infrastructure::database::models::{NewFeedbackModel, NewQueryRunModel};
use crate::infrastructure::database::schema::{feedback, query_runs};
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresQueryRunRepository {
    pool: DbPool,
}

impl PostgresQueryRunRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryRunRepository for PostgresQueryRunRepository {
    async fn insert(&self, run: &QueryRun) -> Result<(), QueryRunRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueryRunRepositoryError::DatabaseError(e.to_string()))?;

        diesel::insert_into(query_runs::table)
            .values(NewQueryRunModel::try_from(run)?)
            .execute(&mut conn)
            .map_err(|e| QueryRunRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool, QueryRunRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueryRunRepositoryError::DatabaseError(e.to_string()))?;

        let count: i64 = query_runs::table
            .filter(query_runs::id.eq(id))
            .count()
            .get_result(&mut conn)
            .map_err(|e| QueryRunRepositoryError::DatabaseError(e.to_string()))?;

        Ok(count > 0)
    }

    async fn insert_feedback(&self, entry: &Feedback) -> Result<(), QueryRunRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueryRunRepositoryError::DatabaseError(e.to_string()))?;

        diesel::insert_into(feedback::table)
            .values(NewFeedbackModel::from(entry))
            .execute(&mut conn)
            .map_err(|e| QueryRunRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
