use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{FileStorage, FileStorageError};

/// Disk layout under the storage root: raw uploads in `uploads/`, extracted
/// text in `text/`. Upload filenames are prefixed with the document id and
/// sanitized, so originals can never collide or escape the directory.
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    async fn ensure_dirs(&self) -> Result<(), FileStorageError> {
        fs::create_dir_all(self.base_path.join("uploads"))
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))?;
        fs::create_dir_all(self.base_path.join("text"))
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))
    }

    fn sanitize_filename(original: &str) -> String {
        let mut out = String::with_capacity(original.len());
        let mut last_was_replacement = false;
        for c in original.chars() {
            if c.is_alphanumeric() || c == '_' || c == '.' || c == '-' {
                out.push(c);
                last_was_replacement = false;
            } else if !last_was_replacement {
                out.push('_');
                last_was_replacement = true;
            }
        }
        out
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save_upload(
        &self,
        document_id: Uuid,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, FileStorageError> {
        self.ensure_dirs().await?;

        let safe_name = Self::sanitize_filename(original_name);
        let path = self
            .base_path
            .join("uploads")
            .join(format!("{}-{}", document_id, safe_name));

        fs::write(&path, data)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))?;

        Ok(path.to_string_lossy().to_string())
    }

    async fn save_extracted_text(
        &self,
        document_id: Uuid,
        text: &str,
    ) -> Result<String, FileStorageError> {
        self.ensure_dirs().await?;

        let path = self.base_path.join("text").join(format!("{}.txt", document_id));

        fs::write(&path, text)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))?;

        Ok(path.to_string_lossy().to_string())
    }
}
