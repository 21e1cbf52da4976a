//! Runtime configuration
//!
//! Everything is read from environment variables (a `.env` file is loaded
//! first by [`crate::run`]). Unset variables fall back to defaults; set but
//! unparseable ones are an error naming the variable.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::models::Coordinates;
use crate::sensors::PositionOptions;

/// Environment variables holding the Gemini credential, in priority order
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} is set without {1}")]
    Incomplete(&'static str, &'static str),
}

/// Settings for the Gemini query collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    /// Credential from the environment; the keychain is consulted when absent
    pub api_key: Option<String>,

    /// Base URL for API (default: https://generativelanguage.googleapis.com)
    pub base_url: String,

    /// Model to use (default: gemini-2.5-flash)
    pub model: String,

    pub temperature: f32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
        }
    }
}

/// Settings for the scan controller
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Pause between entering SEARCHING and issuing the query, so the
    /// scanning animation gets a chance to play
    pub lead_in: Duration,

    pub position: PositionOptions,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            lead_in: Duration::from_secs(3),
            position: PositionOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub scan: ScanConfig,
    /// Coordinates for the headless driver's fixed location provider
    pub fixed_location: Option<Coordinates>,
    /// Heading fed to the controller by the headless driver
    pub fixed_heading: Option<f64>,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.gemini.api_key = API_KEY_VARS.iter().find_map(|key| get(*key));
        if let Some(model) = get("GEMINI_MODEL") {
            config.gemini.model = model;
        }
        if let Some(base_url) = get("GEMINI_BASE_URL") {
            config.gemini.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(temperature) = parse_var::<f32>("KEBAB_TEMPERATURE", get("KEBAB_TEMPERATURE"))? {
            config.gemini.temperature = temperature;
        }

        if let Some(ms) = parse_var::<u64>("KEBAB_SCAN_DELAY_MS", get("KEBAB_SCAN_DELAY_MS"))? {
            config.scan.lead_in = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(
            "KEBAB_LOCATION_TIMEOUT_MS",
            get("KEBAB_LOCATION_TIMEOUT_MS"),
        )? {
            config.scan.position.timeout = Duration::from_millis(ms);
        }

        let latitude = parse_var::<f64>("KEBAB_LATITUDE", get("KEBAB_LATITUDE"))?;
        let longitude = parse_var::<f64>("KEBAB_LONGITUDE", get("KEBAB_LONGITUDE"))?;
        config.fixed_location = match (latitude, longitude) {
            (Some(lat), Some(lon)) => {
                check_range("KEBAB_LATITUDE", lat, 90.0)?;
                check_range("KEBAB_LONGITUDE", lon, 180.0)?;
                Some(Coordinates::new(lat, lon))
            }
            (Some(_), None) => return Err(ConfigError::Incomplete("KEBAB_LATITUDE", "KEBAB_LONGITUDE")),
            (None, Some(_)) => return Err(ConfigError::Incomplete("KEBAB_LONGITUDE", "KEBAB_LATITUDE")),
            (None, None) => None,
        };

        config.fixed_heading = parse_var::<f64>("KEBAB_HEADING", get("KEBAB_HEADING"))?;

        Ok(config)
    }
}

fn parse_var<T>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        })
    })
    .transpose()
}

fn check_range(key: &'static str, value: f64, limit: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value.abs() <= limit {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: format!("must be within ±{}", limit),
        })
    }
}
