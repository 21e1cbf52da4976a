//! Compass heading from device orientation events

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// One device orientation event
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrientationReading {
    /// Platform compass heading (e.g. `webkitCompassHeading`), already clockwise from north
    #[serde(default)]
    pub compass_heading: Option<f64>,
    /// Generic rotation around the z axis, counter-clockwise
    #[serde(default)]
    pub alpha: Option<f64>,
}

impl OrientationReading {
    pub fn from_compass(heading: f64) -> Self {
        Self {
            compass_heading: Some(heading),
            alpha: None,
        }
    }

    pub fn from_alpha(alpha: f64) -> Self {
        Self {
            compass_heading: None,
            alpha: Some(alpha),
        }
    }

    /// Heading in `[0, 360)`, or `None` when the event carries no usable angle
    pub fn heading(&self) -> Option<f64> {
        let raw = match (self.compass_heading, self.alpha) {
            (Some(compass), _) if compass.is_finite() => compass,
            (_, Some(alpha)) if alpha.is_finite() => 360.0 - alpha,
            _ => return None,
        };
        Some(raw.rem_euclid(360.0))
    }
}

/// Latest known heading, shared without locking
#[derive(Debug, Default)]
pub struct HeadingCell(AtomicU64);

impl HeadingCell {
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, degrees: f64) {
        self.0.store(degrees.to_bits(), Ordering::Relaxed);
    }
}
