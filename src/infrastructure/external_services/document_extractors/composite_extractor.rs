use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{TextExtractionError, TextExtractor};
use crate::config::OcrConfig;

use super::docx_extractor::DocxExtractor;
use super::image_extractor::ImageExtractor;
use super::ocr::{OcrBackend, OcrEngine};
use super::pdf_extractor::PdfExtractor;
use super::text_normalizer::normalize_text;

const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "tif", "tiff", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Docx,
    Image,
    Text,
}

/// Routes a stored upload to the right extraction strategy based on MIME
/// type first, then file extension. Anything unrecognized is treated as
/// plain text rather than rejected.
pub struct CompositeExtractor {
    pdf: PdfExtractor,
    docx: DocxExtractor,
    image: ImageExtractor,
    ocr: Arc<dyn OcrBackend>,
}

impl CompositeExtractor {
    pub fn new(ocr_config: OcrConfig) -> Self {
        let ocr: Arc<dyn OcrBackend> = Arc::new(OcrEngine::new(ocr_config));
        Self {
            pdf: PdfExtractor::new(),
            docx: DocxExtractor::new(),
            image: ImageExtractor::new(ocr.clone()),
            ocr,
        }
    }

    fn classify(mime_type: &str, path: &Path) -> DocumentKind {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if mime_type == "application/pdf" || ext == "pdf" {
            return DocumentKind::Pdf;
        }
        if mime_type == DOCX_MIME || ext == "docx" {
            return DocumentKind::Docx;
        }
        if mime_type.starts_with("image/") || IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return DocumentKind::Image;
        }
        DocumentKind::Text
    }

    /// Direct extraction first; when it yields too little text and OCR is
    /// enabled, the document is assumed to be scanned and rasterized. The
    /// longer of the two yields wins.
    async fn extract_pdf(&self, path: &Path) -> Result<String, TextExtractionError> {
        let direct = self.pdf.extract(path)?;

        if self.ocr.enabled() && direct.chars().count() < self.ocr.min_text_chars() {
            tracing::info!(
                path = %path.display(),
                direct_chars = direct.chars().count(),
                "Direct PDF extraction yielded little text, trying OCR"
            );
            let ocr_text = self.ocr.ocr_scanned_pdf(path).await?;
            if ocr_text.chars().count() > direct.chars().count() {
                return Ok(ocr_text);
            }
        }

        Ok(direct)
    }
}

#[async_trait]
impl TextExtractor for CompositeExtractor {
    async fn extract(
        &self,
        mime_type: &str,
        storage_path: &Path,
    ) -> Result<String, TextExtractionError> {
        match Self::classify(mime_type, storage_path) {
            DocumentKind::Pdf => self.extract_pdf(storage_path).await,
            DocumentKind::Docx => {
                let bytes = tokio::fs::read(storage_path)
                    .await
                    .map_err(|e| TextExtractionError::IoError(e.to_string()))?;
                self.docx.extract(&bytes)
            }
            DocumentKind::Image => self.image.extract(storage_path).await,
            DocumentKind::Text => {
                let bytes = tokio::fs::read(storage_path)
                    .await
                    .map_err(|e| TextExtractionError::IoError(e.to_string()))?;
                Ok(normalize_text(&String::from_utf8_lossy(&bytes)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    fn classify(mime: &str, name: &str) -> DocumentKind {
        CompositeExtractor::classify(mime, Path::new(name))
    }

    struct ScriptedOcr {
        enabled: bool,
        min_text_chars: usize,
        scanned_text: String,
        pdf_runs: AtomicUsize,
    }

    impl ScriptedOcr {
        fn new(enabled: bool, min_text_chars: usize, scanned_text: &str) -> Self {
            Self {
                enabled,
                min_text_chars,
                scanned_text: scanned_text.to_string(),
                pdf_runs: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl OcrBackend for ScriptedOcr {
        fn enabled(&self) -> bool {
            self.enabled
        }

        fn min_text_chars(&self) -> usize {
            self.min_text_chars
        }

        async fn ocr_image_file(&self, _image_path: &Path) -> Result<String, TextExtractionError> {
            Ok(self.scanned_text.clone())
        }

        async fn ocr_scanned_pdf(&self, _pdf_path: &Path) -> Result<String, TextExtractionError> {
            self.pdf_runs.fetch_add(1, Ordering::SeqCst);
            Ok(self.scanned_text.clone())
        }
    }

    fn extractor_with(ocr: Arc<ScriptedOcr>) -> CompositeExtractor {
        let backend: Arc<dyn OcrBackend> = ocr;
        CompositeExtractor {
            pdf: PdfExtractor::new(),
            docx: DocxExtractor::new(),
            image: ImageExtractor::new(backend.clone()),
            ocr: backend,
        }
    }

    fn write_pdf(path: &Path, text: &str) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_mime_type_takes_precedence() {
        assert_eq!(classify("application/pdf", "report.bin"), DocumentKind::Pdf);
        assert_eq!(classify(DOCX_MIME, "notes.bin"), DocumentKind::Docx);
        assert_eq!(classify("image/png", "scan.bin"), DocumentKind::Image);
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(
            classify("application/octet-stream", "report.PDF"),
            DocumentKind::Pdf
        );
        assert_eq!(
            classify("application/octet-stream", "notes.docx"),
            DocumentKind::Docx
        );
        assert_eq!(
            classify("application/octet-stream", "scan.jpeg"),
            DocumentKind::Image
        );
    }

    #[test]
    fn test_unknown_types_fall_back_to_plain_text() {
        assert_eq!(classify("application/octet-stream", "data.csv"), DocumentKind::Text);
        assert_eq!(classify("text/markdown", "readme.md"), DocumentKind::Text);
        assert_eq!(classify("", "no_extension"), DocumentKind::Text);
    }

    #[tokio::test]
    async fn test_plain_text_is_read_and_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello  \r\nworld\n\n\n\nend").unwrap();

        let extractor = CompositeExtractor::new(OcrConfig::default());
        let text = extractor.extract("text/plain", &path).await.unwrap();
        assert_eq!(text, "hello\nworld\n\nend");
    }

    #[tokio::test]
    async fn test_low_yield_pdf_falls_back_to_ocr_when_it_yields_more() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        write_pdf(&path, "Faint stamp");

        let scanned = "Invoice 2291 issued on March 4th covering the full quarterly \
                       maintenance retainer for the Lakeside property.";
        let ocr = Arc::new(ScriptedOcr::new(true, 500, scanned));
        let extractor = extractor_with(ocr.clone());

        let text = extractor.extract("application/pdf", &path).await.unwrap();
        assert_eq!(text, scanned);
        assert_eq!(ocr.pdf_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_direct_pdf_text_wins_over_shorter_ocr_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        write_pdf(&path, "Quarterly totals reconciled against the ledger");

        let ocr = Arc::new(ScriptedOcr::new(true, 500, "Q"));
        let extractor = extractor_with(ocr.clone());

        let text = extractor.extract("application/pdf", &path).await.unwrap();
        assert!(text.contains("Quarterly totals"));
        // OCR ran but its shorter output was discarded.
        assert_eq!(ocr.pdf_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ocr_disabled_keeps_direct_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.pdf");
        write_pdf(&path, "Short memo");

        let ocr = Arc::new(ScriptedOcr::new(false, 500, "should never appear"));
        let extractor = extractor_with(ocr.clone());

        let text = extractor.extract("application/pdf", &path).await.unwrap();
        assert!(text.contains("Short memo"));
        assert_eq!(ocr.pdf_runs.load(Ordering::SeqCst), 0);
    }
}
