use async_trait::async_trait;
use std::path::Path;

#[derive(Debug)]
pub enum TextExtractionError {
    UnsupportedFormat(String),
    CorruptedFile(String),
    ExtractionFailed(String),
    OcrFailed(String),
    IoError(String),
}

impl std::fmt::Display for TextExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextExtractionError::UnsupportedFormat(format) => {
                write!(f, "Unsupported format: {}", format)
            }
            TextExtractionError::CorruptedFile(msg) => write!(f, "Corrupted file: {}", msg),
            TextExtractionError::ExtractionFailed(msg) => write!(f, "Extraction failed: {}", msg),
            TextExtractionError::OcrFailed(msg) => write!(f, "OCR failed: {}", msg),
            TextExtractionError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for TextExtractionError {}

/// Turns a stored upload into normalized plain text, applying the OCR
/// fallback policy where direct extraction yields too little.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(
        &self,
        mime_type: &str,
        storage_path: &Path,
    ) -> Result<String, TextExtractionError>;
}
