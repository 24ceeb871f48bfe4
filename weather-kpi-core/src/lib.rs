//! Core library for the `weather-kpi` dashboard.
//!
//! This crate defines:
//! - Typed models for current conditions, forecasts and KPIs
//! - Normalization of raw OpenWeatherMap payloads
//! - A read-time TTL cache and the service that wires it to a provider
//! - KPI derivation (trend, stability, aggregates)
//! - Configuration & credentials handling
//!
//! It is used by `weather-kpi-cli`, but can also be reused by other front ends.

pub mod cache;
pub mod config;
pub mod error;
pub mod kpi;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod service;
pub mod units;

pub use cache::{CacheKey, TtlCache};
pub use config::Config;
pub use error::WeatherError;
pub use kpi::compute_kpis;
pub use model::{
    Coordinate, CurrentObservation, DailySummary, ForecastPoint, ForecastSeries, KpiSet,
    ResourceKind,
};
pub use normalize::{normalize_current, normalize_forecast};
pub use provider::{GeoMatch, OpenWeatherGateway, WeatherGateway};
pub use service::{Dashboard, ServiceSettings, WeatherService};
