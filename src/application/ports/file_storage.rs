use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug)]
pub enum FileStorageError {
    IoError(String),
    InvalidPath(String),
}

impl std::fmt::Display for FileStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStorageError::IoError(msg) => write!(f, "IO error: {}", msg),
            FileStorageError::InvalidPath(path) => write!(f, "Invalid path: {}", path),
        }
    }
}

impl std::error::Error for FileStorageError {}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persist raw upload bytes; returns the storage path recorded on the
    /// document.
    async fn save_upload(
        &self,
        document_id: Uuid,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, FileStorageError>;

    /// Persist extracted text; returns the text path recorded on the
    /// document.
    async fn save_extracted_text(
        &self,
        document_id: Uuid,
        text: &str,
    ) -> Result<String, FileStorageError>;
}
