//! Place Extraction
//!
//! Normalizes the model's free-text answer into at most one [`Place`]:
//! - Labeled line fields (`Name:`, `Address:`, `Distance:`, `Reason:`)
//! - Reconciliation against Google Maps grounding chunks
//! - Synthesized map-search links when grounding has nothing usable
//!
//! Never fails. Missing fields fall back to fixed defaults and a missing name
//! yields an empty result.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use tracing::debug;

use crate::models::{GroundingChunk, MapsSource, Place};

/// Stand-in name; an answer that resolves to it produces no place
pub const UNKNOWN_NAME: &str = "Unknown Kebab";
pub const UNKNOWN_DISTANCE: &str = "N/A";
pub const DEFAULT_DESCRIPTION: &str = "Highly recommended.";

/// Base URL for synthesized deep links
const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";

/// Only one candidate is ever produced per scan
const PLACE_ID: &str = "target-1";

static NAME_FIELD: Lazy<Regex> = Lazy::new(|| field_regex("name"));
static ADDRESS_FIELD: Lazy<Regex> = Lazy::new(|| field_regex("address"));
static DISTANCE_FIELD: Lazy<Regex> = Lazy::new(|| field_regex("distance"));
static REASON_FIELD: Lazy<Regex> = Lazy::new(|| field_regex("reason"));

/// Line-prefix matcher for `<label>: value`.
///
/// Leading list/quote markers and markdown emphasis around the label or the
/// value are skipped. The value never spans lines.
fn field_regex(label: &str) -> Regex {
    Regex::new(&format!(
        r"(?im)^[ \t>*_#-]*{label}[ \t*_]*:[ \t*_]*([^\s*_].*?)[ \t*_\r]*$"
    ))
    .expect("field pattern is a valid regex")
}

fn capture_field(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Raw labeled fields found in a response, before any fallback is applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseFields {
    pub name: Option<String>,
    pub address: Option<String>,
    pub distance: Option<String>,
    pub reason: Option<String>,
}

impl ResponseFields {
    pub fn parse(text: &str) -> Self {
        Self {
            name: capture_field(&NAME_FIELD, text)
                .filter(|name| !name.eq_ignore_ascii_case(UNKNOWN_NAME)),
            address: capture_field(&ADDRESS_FIELD, text),
            distance: capture_field(&DISTANCE_FIELD, text),
            reason: capture_field(&REASON_FIELD, text),
        }
    }
}

/// Outcome of matching the extracted name against grounding chunks
#[derive(Debug, Clone, PartialEq)]
enum Grounding<'a> {
    /// A maps chunk whose title appears inside the extracted name
    Matched(&'a MapsSource),
    /// No title matched; the first maps chunk is assumed to be the subject
    FirstMap(&'a MapsSource),
    None,
}

fn ground<'a>(name: &str, chunks: &'a [GroundingChunk]) -> Grounding<'a> {
    let folded_name = name.to_lowercase();
    let mut maps = chunks.iter().filter_map(|chunk| chunk.maps.as_ref());

    if let Some(matched) = maps
        .clone()
        .find(|m| !m.title.is_empty() && folded_name.contains(&m.title.to_lowercase()))
    {
        return Grounding::Matched(matched);
    }

    match maps.next() {
        Some(first) => Grounding::FirstMap(first),
        None => Grounding::None,
    }
}

/// Build a map-search deep link from a name and address
pub fn map_search_uri(name: &str, address: &str) -> String {
    let query = format!("{} {}", name, address);
    Url::parse_with_params(MAPS_SEARCH_URL, &[("api", "1"), ("query", query.trim())])
        .map(String::from)
        .unwrap_or_else(|_| MAPS_SEARCH_URL.to_string())
}

/// Turn a model answer into at most one place
pub fn extract_places(text: &str, chunks: Option<&[GroundingChunk]>) -> Vec<Place> {
    let fields = ResponseFields::parse(text);

    let Some(mut name) = fields.name else {
        debug!(text_len = text.len(), "No place name in response");
        return Vec::new();
    };

    let grounded_uri = match ground(&name, chunks.unwrap_or(&[])) {
        Grounding::Matched(maps) => {
            debug!(extracted = %name, title = %maps.title, "Name matched grounding chunk");
            name = maps.title.clone();
            Some(maps.uri.clone())
        }
        Grounding::FirstMap(maps) => {
            debug!(extracted = %name, title = %maps.title, "No title match, using first maps chunk");
            Some(maps.uri.clone())
        }
        Grounding::None => None,
    };

    let address = fields.address.unwrap_or_default();
    let uri = grounded_uri
        .filter(|uri| !uri.is_empty())
        .unwrap_or_else(|| map_search_uri(&name, &address));

    vec![Place {
        id: PLACE_ID.to_string(),
        name,
        address,
        distance: fields
            .distance
            .unwrap_or_else(|| UNKNOWN_DISTANCE.to_string()),
        description: fields
            .reason
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        uri: Some(uri),
    }]
}
