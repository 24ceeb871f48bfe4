//! Raw provider payloads into typed, metric, rounded records.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    WeatherError,
    model::{CurrentObservation, ForecastPoint, ForecastSeries},
    units::{capitalize_first, mps_to_kmh, round1},
};

pub const UNKNOWN_LOCATION: &str = "Unknown Location";

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: Option<String>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwForecastWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Normalize a current-conditions payload, stamping it with the wall clock.
pub fn normalize_current(raw: &Value) -> Result<CurrentObservation, WeatherError> {
    normalize_current_at(raw, Utc::now())
}

/// Normalize a current-conditions payload with an explicit capture time.
pub fn normalize_current_at(
    raw: &Value,
    observed_at: DateTime<Utc>,
) -> Result<CurrentObservation, WeatherError> {
    let parsed = OwCurrentResponse::deserialize(raw)
        .map_err(|e| WeatherError::MalformedPayload(format!("current conditions: {e}")))?;

    let weather = parsed.weather.into_iter().next().ok_or_else(|| {
        WeatherError::MalformedPayload("current conditions: `weather` array is empty".into())
    })?;

    let observation = CurrentObservation {
        temperature: round1(parsed.main.temp),
        feels_like: round1(parsed.main.feels_like),
        humidity: parsed.main.humidity,
        pressure: parsed.main.pressure,
        wind_speed: mps_to_kmh(parsed.wind.speed),
        description: capitalize_first(&weather.description),
        icon: weather.icon,
        city: parsed.name.unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        observed_at,
    };

    tracing::debug!(city = %observation.city, "normalized current conditions");
    Ok(observation)
}

/// Normalize a forecast payload. An empty `list` is malformed, since a
/// returned series is never empty.
pub fn normalize_forecast(raw: &Value) -> Result<ForecastSeries, WeatherError> {
    let parsed = OwForecastResponse::deserialize(raw)
        .map_err(|e| WeatherError::MalformedPayload(format!("forecast: {e}")))?;

    let points = parsed
        .list
        .into_iter()
        .enumerate()
        .map(|(i, entry)| forecast_point(i, entry))
        .collect::<Result<Vec<_>, _>>()?;

    let series = ForecastSeries::new(points).ok_or_else(|| {
        WeatherError::MalformedPayload("forecast: `list` contains no entries".into())
    })?;

    tracing::debug!(points = series.len(), "normalized forecast");
    Ok(series)
}

fn forecast_point(index: usize, entry: OwForecastEntry) -> Result<ForecastPoint, WeatherError> {
    let timestamp = DateTime::from_timestamp(entry.dt, 0).ok_or_else(|| {
        WeatherError::MalformedPayload(format!(
            "forecast entry {index}: `dt` {} out of range",
            entry.dt
        ))
    })?;

    let weather = entry.weather.into_iter().next().ok_or_else(|| {
        WeatherError::MalformedPayload(format!("forecast entry {index}: `weather` array is empty"))
    })?;

    Ok(ForecastPoint {
        timestamp,
        temperature: round1(entry.main.temp),
        humidity: entry.main.humidity,
        wind_speed: mps_to_kmh(entry.wind.speed),
        description: capitalize_first(&weather.description),
    })
}
