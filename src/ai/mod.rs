pub mod credentials;
pub mod extractor;
pub mod gemini;
pub mod http_client;
pub mod prompts;
pub mod query;

pub use credentials::*;
pub use extractor::{extract_places, map_search_uri};
pub use gemini::GeminiClient;
pub use query::*;
