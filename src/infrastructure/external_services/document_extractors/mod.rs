pub mod composite_extractor;
pub mod docx_extractor;
pub mod image_extractor;
pub mod ocr;
pub mod pdf_extractor;
pub mod text_normalizer;

pub use composite_extractor::CompositeExtractor;
