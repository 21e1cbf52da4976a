//! The query collaborator seam used by the scan controller

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Coordinates, Place};

/// Why a place query failed.
///
/// The controller treats every variant as the same "query failed" outcome;
/// the distinction exists for logs and for callers that want to prompt for a
/// missing credential.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("API configuration missing: no credential for {provider}")]
    MissingCredential { provider: &'static str },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl QueryError {
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential { .. })
    }
}

/// Finds candidate places near a position
#[async_trait]
pub trait PlaceQuery: Send + Sync {
    /// At most one place, best candidate first
    async fn find_places(&self, coords: Coordinates) -> Result<Vec<Place>, QueryError>;
}
