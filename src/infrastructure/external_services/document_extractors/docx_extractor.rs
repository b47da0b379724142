use std::io::Read;

use crate::application::ports::TextExtractionError;

use super::text_normalizer::normalize_text;

/// Largest word/document.xml we are willing to decompress (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// DOCX extraction: pull word/document.xml out of the OOXML zip and collect
/// the `w:t` text runs, with a paragraph break per `w:p` element.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, bytes: &[u8]) -> Result<String, TextExtractionError> {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
            .map_err(|e| TextExtractionError::CorruptedFile(e.to_string()))?;

        let mut doc_xml = Vec::new();
        {
            let entry = archive
                .by_name("word/document.xml")
                .map_err(|_| {
                    TextExtractionError::CorruptedFile(
                        "word/document.xml not found in archive".to_string(),
                    )
                })?;
            entry
                .take(MAX_XML_ENTRY_BYTES)
                .read_to_end(&mut doc_xml)
                .map_err(|e| TextExtractionError::IoError(e.to_string()))?;
            if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
                return Err(TextExtractionError::CorruptedFile(
                    "word/document.xml exceeds size limit".to_string(),
                ));
            }
        }

        let text = collect_text_runs(&doc_xml)?;
        Ok(normalize_text(&text))
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_text_runs(xml: &[u8]) -> Result<String, TextExtractionError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(quick_xml::events::Event::Text(e)) => {
                if in_text_run {
                    out.push_str(e.unescape().unwrap_or_default().as_ref());
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"t" => in_text_run = false,
                    // Paragraph boundary.
                    b"p" => out.push('\n'),
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(TextExtractionError::CorruptedFile(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}
