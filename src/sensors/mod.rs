//! Sensor collaborators
//!
//! The controller never talks to hardware directly. Location arrives through
//! a [`LocationProvider`] (one result per request) and orientation through a
//! stream of [`OrientationReading`]s (latest value wins).

pub mod fixed;
pub mod orientation;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::Coordinates;

pub use fixed::FixedLocation;
pub use orientation::{HeadingCell, OrientationReading};

/// Options handed to the location collaborator on every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    /// Ask for GPS-grade accuracy rather than network positioning
    pub high_accuracy: bool,
    /// Upper bound on a single acquisition
    pub timeout: Duration,
    /// Oldest cached position the collaborator may return (zero = always fresh)
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Why a position could not be acquired
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("location error: {0}")]
    Other(String),
}

impl LocationError {
    /// Short message shown to the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => "Access Denied. Enable Location Services.".to_string(),
            Self::PositionUnavailable => "Position Unavailable. Check Signal.".to_string(),
            Self::Timeout => "Connection Timed Out. Retry Scan.".to_string(),
            Self::Other(detail) => format!("GPS Error: {}", detail),
        }
    }
}

/// Source of device position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Whether the platform offers location at all
    fn is_available(&self) -> bool {
        true
    }

    /// Acquire the current position once
    async fn current_position(&self, options: &PositionOptions)
        -> Result<Coordinates, LocationError>;
}
