use crate::{Coordinate, ResourceKind, WeatherError};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::{GeoMatch, OpenWeatherGateway};

/// A single-attempt fetch of a raw provider payload.
///
/// Implementations must not retry; failures are mapped onto [`WeatherError`]
/// and returned as-is.
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    async fn fetch(
        &self,
        kind: ResourceKind,
        coordinate: Coordinate,
    ) -> Result<Value, WeatherError>;
}
