pub mod content_hash;
pub mod lifecycle;
pub mod trusted_domains;

pub use content_hash::ContentHash;
pub use lifecycle::{IngestionStage, ProcessingStatus};
pub use trusted_domains::TrustedDomains;
