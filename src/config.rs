use std::env;

#[derive(Debug)]
pub enum ConfigError {
    MissingVar(String),
    InvalidVar(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVar(name) => write!(f, "Missing environment variable: {}", name),
            ConfigError::InvalidVar(name, msg) => {
                write!(f, "Invalid value for {}: {}", name, msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// OCR fallback policy for scanned PDFs and images.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub enabled: bool,
    pub dpi: u32,
    pub max_pages: u32,
    /// Direct PDF extraction yielding fewer characters than this triggers OCR.
    pub min_text_chars: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dpi: 200,
            max_pages: 15,
            min_text_chars: 400,
        }
    }
}

/// All runtime settings, gathered once at startup and passed to components
/// at construction. Components never read the environment themselves.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub storage_dir: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub trusted_domains: String,
    pub max_external_snippets: usize,
    pub ocr: OcrConfig,
    pub ingest_workers: usize,
    pub job_max_attempts: u32,
    pub job_backoff_ms: u64,
    /// Answers built purely from external evidence never exceed this confidence.
    pub external_confidence_cap: f64,
    /// Document-only answers below this confidence trigger external enrichment.
    pub enrich_confidence_threshold: f64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: parse_or("PORT", 3000)?,
            database_url: require("DATABASE_URL")?,
            storage_dir: env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string()),
            openai_api_key: require("OPENAI_API_KEY")?,
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            trusted_domains: env::var("TRUSTED_DOMAINS")
                .unwrap_or_else(|_| "en.wikipedia.org".to_string()),
            max_external_snippets: parse_or("AUTO_ENRICH_MAX_SNIPPETS", 3)?,
            ocr: OcrConfig {
                enabled: parse_or("SCANNED_PDF_OCR_ENABLED", true)?,
                dpi: parse_or("OCR_PDF_DPI", 200)?,
                max_pages: parse_or("OCR_PDF_MAX_PAGES", 15)?,
                min_text_chars: parse_or("OCR_MIN_TEXT_CHARS", 400)?,
            },
            ingest_workers: parse_or("INGEST_WORKERS", 2)?,
            job_max_attempts: parse_or("JOB_MAX_ATTEMPTS", 3)?,
            job_backoff_ms: parse_or("JOB_BACKOFF_MS", 1500)?,
            external_confidence_cap: parse_or("EXTERNAL_CONFIDENCE_CAP", 0.6)?,
            enrich_confidence_threshold: parse_or("ENRICH_CONFIDENCE_THRESHOLD", 0.55)?,
        })
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidVar(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocr_defaults() {
        let ocr = OcrConfig::default();
        assert!(ocr.enabled);
        assert_eq!(ocr.dpi, 200);
        assert_eq!(ocr.max_pages, 15);
        assert_eq!(ocr.min_text_chars, 400);
    }
}
