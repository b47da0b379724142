use async_trait::async_trait;
use diesel::prelude::*;
use pgvector::{Vector, VectorExpressionMethods};
use uuid::Uuid;

use crate::domain::entities::{DocumentChunk, RetrievedChunk};
use crate::domain::repositories::{ChunkRepository, ChunkRepositoryError};
use crate::domain::value_objects::ProcessingStatus;
use crate::infrastructure::database::models::{ChunkHitRow, NewChunkModel};
use crate::infrastructure::database::schema::{chunks, documents};
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresChunkRepository {
    pool: DbPool,
}

impl PostgresChunkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChunkRepository for PostgresChunkRepository {
    async fn replace_for_document(
        &self,
        document_id: Uuid,
        new_chunks: &[DocumentChunk],
    ) -> Result<(), ChunkRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        let rows: Vec<NewChunkModel> = new_chunks.iter().map(NewChunkModel::from).collect();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(chunks::table.filter(chunks::document_id.eq(document_id)))
                .execute(conn)?;
            diesel::insert_into(chunks::table)
                .values(&rows)
                .execute(conn)?;
            Ok(())
        })
        .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        // Fresh statistics keep the ivfflat index planner honest after a
        // bulk replace.
        if let Err(e) = diesel::sql_query("ANALYZE chunks").execute(&mut conn) {
            tracing::warn!(error = %e, "ANALYZE chunks failed after replace");
        }

        Ok(())
    }

    async fn search(
        &self,
        query_vector: &Vector,
        limit: i64,
        document_ids: Option<&[Uuid]>,
    ) -> Result<Vec<RetrievedChunk>, ChunkRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        let mut query = chunks::table
            .inner_join(documents::table)
            .filter(documents::status.eq(ProcessingStatus::Completed.as_str()))
            .select((
                chunks::id,
                chunks::document_id,
                chunks::text,
                chunks::embedding.cosine_distance(query_vector.clone()),
            ))
            .order(chunks::embedding.cosine_distance(query_vector.clone()).asc())
            .then_order_by(chunks::id.asc())
            .limit(limit)
            .into_boxed();

        if let Some(ids) = document_ids {
            query = query.filter(chunks::document_id.eq_any(ids.to_vec()));
        }

        let rows = query
            .load::<ChunkHitRow>(&mut conn)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(RetrievedChunk::from).collect())
    }

    async fn count_for_document(&self, document_id: Uuid) -> Result<i64, ChunkRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        chunks::table
            .filter(chunks::document_id.eq(document_id))
            .count()
            .get_result(&mut conn)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))
    }
}
