pub mod document_handler;
pub mod query_handler;

pub use document_handler::DocumentHandler;
pub use query_handler::QueryHandler;
