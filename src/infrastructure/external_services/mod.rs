pub mod document_extractors;
pub mod openai_client;
pub mod wikipedia_client;

pub use openai_client::{OpenAiClient, OpenAiClientConfig};
pub use wikipedia_client::WikipediaClient;
