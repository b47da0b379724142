use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::TextExtractionError;
use crate::config::OcrConfig;

use super::text_normalizer::normalize_text;

/// OCR capability as the extractors consume it: a policy (enabled, minimum
/// direct-extraction yield) plus the two rasterization entry points.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    fn enabled(&self) -> bool;

    /// Direct PDF extraction yielding fewer characters than this triggers OCR.
    fn min_text_chars(&self) -> usize;

    /// OCR a single raster image file to text.
    async fn ocr_image_file(&self, image_path: &Path) -> Result<String, TextExtractionError>;

    /// Rasterize a scanned PDF and OCR each page.
    async fn ocr_scanned_pdf(&self, pdf_path: &Path) -> Result<String, TextExtractionError>;
}

/// Shells out to tesseract (and pdftoppm for scanned PDFs). Both binaries
/// must be on PATH; a missing binary surfaces as an OCR failure on first
/// use rather than at startup.
#[derive(Debug, Clone)]
pub struct OcrEngine {
    config: OcrConfig,
}

impl OcrEngine {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl OcrBackend for OcrEngine {
    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn min_text_chars(&self) -> usize {
        self.config.min_text_chars
    }

    async fn ocr_image_file(&self, image_path: &Path) -> Result<String, TextExtractionError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", "eng"])
            .output()
            .await
            .map_err(|e| TextExtractionError::OcrFailed(format!("tesseract: {}", e)))?;

        if !output.status.success() {
            return Err(TextExtractionError::OcrFailed(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(normalize_text(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Rasterize a scanned PDF with pdftoppm and OCR each page, bounded by
    /// the configured DPI and page cap. Page texts are joined with `[PAGE n]`
    /// markers; pages yielding nothing are omitted.
    async fn ocr_scanned_pdf(&self, pdf_path: &Path) -> Result<String, TextExtractionError> {
        let tmp_dir = tempfile::tempdir()
            .map_err(|e| TextExtractionError::IoError(e.to_string()))?;
        let out_prefix = tmp_dir.path().join("page");

        let output = Command::new("pdftoppm")
            .args(["-png", "-r", &self.config.dpi.to_string()])
            .args(["-f", "1", "-l", &self.config.max_pages.to_string()])
            .arg(pdf_path)
            .arg(&out_prefix)
            .output()
            .await
            .map_err(|e| TextExtractionError::OcrFailed(format!("pdftoppm: {}", e)))?;

        if !output.status.success() {
            return Err(TextExtractionError::OcrFailed(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut pages: Vec<(u32, std::path::PathBuf)> = std::fs::read_dir(tmp_dir.path())
            .map_err(|e| TextExtractionError::IoError(e.to_string()))?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                let name = path.file_name()?.to_str()?;
                if !name.starts_with("page-") || !name.ends_with(".png") {
                    return None;
                }
                let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
                Some((digits.parse().ok()?, path))
            })
            .collect();
        pages.sort_by_key(|(index, _)| *index);

        let mut full = String::new();
        for (i, (_, page_path)) in pages.iter().enumerate() {
            let page_text = self.ocr_image_file(page_path).await?;
            if !page_text.is_empty() {
                full.push_str(&format!("\n\n[PAGE {}]\n{}\n", i + 1, page_text));
            }
        }

        Ok(normalize_text(&full))
    }
}
