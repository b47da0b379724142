use std::path::Path;
use std::sync::Arc;

use crate::application::ports::TextExtractionError;

use super::ocr::OcrBackend;

/// OCR for standalone raster images. The image is converted to grayscale
/// with boosted contrast before OCR, which noticeably improves tesseract's
/// hit rate on photos of documents.
pub struct ImageExtractor {
    ocr: Arc<dyn OcrBackend>,
}

impl ImageExtractor {
    pub fn new(ocr: Arc<dyn OcrBackend>) -> Self {
        Self { ocr }
    }

    pub async fn extract(&self, path: &Path) -> Result<String, TextExtractionError> {
        let img = image::open(path)
            .map_err(|e| TextExtractionError::CorruptedFile(e.to_string()))?;
        let processed = img.grayscale().adjust_contrast(20.0);

        let tmp_dir = tempfile::tempdir()
            .map_err(|e| TextExtractionError::IoError(e.to_string()))?;
        let png_path = tmp_dir.path().join("preprocessed.png");
        processed
            .save(&png_path)
            .map_err(|e| TextExtractionError::IoError(e.to_string()))?;

        self.ocr.ocr_image_file(&png_path).await
    }
}
