//! Gemini place query
//!
//! ```text
//! Coordinates ─► prompt + googleMaps tool ─► generateContent
//!                                              │
//!            Vec<Place> ◄─ extractor ◄─ text + groundingChunks
//! ```

mod client;
pub mod types;

pub use client::{GeminiClient, CREDENTIAL_PROVIDER};
