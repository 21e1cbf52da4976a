use async_trait::async_trait;

use super::{LocationError, LocationProvider, PositionOptions};
use crate::models::Coordinates;

/// Location provider backed by preconfigured coordinates.
///
/// Used by the headless driver where there is no positioning hardware. With
/// no coordinates configured it reports the capability as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation {
    coords: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(coords: Option<Coordinates>) -> Self {
        Self { coords }
    }

    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::new(Some(Coordinates::new(latitude, longitude)))
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    fn is_available(&self) -> bool {
        self.coords.is_some()
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        self.coords.ok_or(LocationError::PositionUnavailable)
    }
}
