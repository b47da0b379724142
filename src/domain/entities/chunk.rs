use pgvector::Vector;
use uuid::Uuid;

/// An embedded segment of a document's extracted text, the unit of
/// retrieval. The full chunk set for a document is replaced wholesale on
/// reprocessing; chunk indexes are 0-based and contiguous per document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    id: Uuid,
    document_id: Uuid,
    chunk_index: i32,
    text: String,
    token_estimate: i32,
    embedding: Vector,
}

impl DocumentChunk {
    pub fn new(
        document_id: Uuid,
        chunk_index: i32,
        text: String,
        token_estimate: i32,
        embedding: Vector,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            chunk_index,
            text,
            token_estimate,
            embedding,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn chunk_index(&self) -> i32 {
        self.chunk_index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn token_estimate(&self) -> i32 {
        self.token_estimate
    }

    pub fn embedding(&self) -> &Vector {
        &self.embedding
    }
}

/// A chunk as returned by similarity search, with its distance to the
/// query vector (lower is more similar).
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk_id: Uuid,
    pub document_id: Uuid,
    pub text: String,
    pub distance: f64,
}
