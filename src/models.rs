//! Shared data types for the scan pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A position on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A successfully acquired position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fix {
    pub coords: Coordinates,
    /// When the location collaborator delivered the position
    pub acquired_at: DateTime<Utc>,
}

impl Fix {
    pub fn now(coords: Coordinates) -> Self {
        Self {
            coords,
            acquired_at: Utc::now(),
        }
    }
}

/// The single candidate restaurant produced by one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Opaque, only stable within the scan that produced it
    pub id: String,
    pub name: String,
    /// Empty when the upstream text carried no address
    pub address: String,
    /// Display string as written upstream (e.g. "1.2 km"), never parsed
    pub distance: String,
    pub description: String,
    /// Map deep link, opened in a new browsing context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Structured corroboration returned alongside the model's free text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<MapsSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapsSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}
