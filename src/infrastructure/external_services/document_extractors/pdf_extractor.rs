use std::path::Path;

use lopdf::Document;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::application::ports::TextExtractionError;

use super::text_normalizer::normalize_text;

/// Direct (non-OCR) PDF text extraction via lopdf. Pages are extracted in
/// parallel; a page that fails to decode is skipped rather than failing
/// the document.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, path: &Path) -> Result<String, TextExtractionError> {
        let mut doc = Document::load(path)
            .map_err(|e| TextExtractionError::CorruptedFile(e.to_string()))?;

        if doc.is_encrypted() {
            doc.decrypt("").map_err(|_| {
                TextExtractionError::ExtractionFailed(
                    "PDF is encrypted and cannot be read".to_string(),
                )
            })?;
        }

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

        let mut page_texts: Vec<(u32, String)> = page_numbers
            .into_par_iter()
            .filter_map(|page_num| {
                let text = doc.extract_text(&[page_num]).ok()?;
                let lines: Vec<&str> = text
                    .split('\n')
                    .map(|s| s.trim_end())
                    .filter(|s| !s.is_empty())
                    .collect();
                if lines.is_empty() {
                    None
                } else {
                    Some((page_num, lines.join("\n")))
                }
            })
            .collect();
        page_texts.sort_by_key(|(page_num, _)| *page_num);

        let combined = page_texts
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(normalize_text(&combined))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}
