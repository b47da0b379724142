use diesel::prelude::*;
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::{DocumentChunk, RetrievedChunk};
use crate::infrastructure::database::schema::chunks;

#[derive(Debug, Insertable)]
#[diesel(table_name = chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewChunkModel {
    pub id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: i32,
    pub text: String,
    pub token_estimate: i32,
    pub embedding: Vector,
}

impl From<&DocumentChunk> for NewChunkModel {
    fn from(chunk: &DocumentChunk) -> Self {
        Self {
            id: chunk.id(),
            document_id: chunk.document_id(),
            chunk_index: chunk.chunk_index(),
            text: chunk.text().to_string(),
            token_estimate: chunk.token_estimate(),
            embedding: chunk.embedding().clone(),
        }
    }
}

/// Row shape of a similarity search hit: chunk columns plus the computed
/// cosine distance.
#[derive(Debug, Queryable)]
pub struct ChunkHitRow {
    pub id: Uuid,
    pub document_id: Uuid,
    pub text: String,
    pub distance: f64,
}

impl From<ChunkHitRow> for RetrievedChunk {
    fn from(row: ChunkHitRow) -> Self {
        RetrievedChunk {
            chunk_id: row.id,
            document_id: row.document_id,
            text: row.text,
            distance: row.distance,
        }
    }
}
