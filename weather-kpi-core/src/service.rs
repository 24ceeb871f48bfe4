use std::{sync::Arc, time::Duration};

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{
    Coordinate, CurrentObservation, ForecastSeries, KpiSet, ResourceKind, WeatherError,
    cache::{CacheKey, DEFAULT_TTL, TtlCache},
    kpi::compute_kpis,
    normalize::{normalize_current, normalize_forecast},
    provider::WeatherGateway,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Everything a dashboard needs for one coordinate.
///
/// Each normalized object carries its own error so the caller can show what
/// succeeded and report what did not.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub coordinate: Coordinate,
    #[serde(serialize_with = "serialize_outcome")]
    pub current: Result<CurrentObservation, WeatherError>,
    #[serde(serialize_with = "serialize_outcome")]
    pub forecast: Result<ForecastSeries, WeatherError>,
    pub kpis: KpiSet,
}

/// Fetches, normalizes, caches and reduces weather data for coordinates.
///
/// Cheap to share behind an `Arc`; all state lives in the two cache lines.
#[derive(Debug)]
pub struct WeatherService {
    gateway: Arc<dyn WeatherGateway>,
    request_timeout: Duration,
    current: TtlCache<CacheKey, CurrentObservation>,
    forecast: TtlCache<CacheKey, ForecastSeries>,
}

impl WeatherService {
    pub fn new(gateway: Arc<dyn WeatherGateway>, settings: ServiceSettings) -> Self {
        Self {
            gateway,
            request_timeout: settings.request_timeout,
            current: TtlCache::new(settings.cache_ttl),
            forecast: TtlCache::new(settings.cache_ttl),
        }
    }

    pub async fn current(
        &self,
        coordinate: Coordinate,
    ) -> Result<CurrentObservation, WeatherError> {
        let key = CacheKey::new(coordinate, ResourceKind::Current);
        self.current
            .get_or_compute(key, || async {
                let raw = self.fetch_bounded(ResourceKind::Current, coordinate).await?;
                normalize_current(&raw)
            })
            .await
    }

    pub async fn forecast(&self, coordinate: Coordinate) -> Result<ForecastSeries, WeatherError> {
        let key = CacheKey::new(coordinate, ResourceKind::Forecast);
        self.forecast
            .get_or_compute(key, || async {
                let raw = self.fetch_bounded(ResourceKind::Forecast, coordinate).await?;
                normalize_forecast(&raw)
            })
            .await
    }

    /// Current conditions, forecast and KPIs, fetched concurrently.
    pub async fn dashboard(&self, coordinate: Coordinate) -> Dashboard {
        let (current, forecast) = tokio::join!(self.current(coordinate), self.forecast(coordinate));

        if let Err(e) = &current {
            tracing::warn!(%coordinate, error = %e, "current conditions unavailable");
        }
        if let Err(e) = &forecast {
            tracing::warn!(%coordinate, error = %e, "forecast unavailable");
        }

        let kpis = compute_kpis(current.as_ref().ok(), forecast.as_ref().ok());

        Dashboard {
            coordinate,
            current,
            forecast,
            kpis,
        }
    }

    /// Drop all cached results, forcing the next calls to hit the provider.
    pub async fn clear_cache(&self) {
        self.current.clear().await;
        self.forecast.clear().await;
    }

    async fn fetch_bounded(
        &self,
        kind: ResourceKind,
        coordinate: Coordinate,
    ) -> Result<Value, WeatherError> {
        let call = self.gateway.fetch(kind, coordinate);
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    %kind,
                    %coordinate,
                    timeout = ?self.request_timeout,
                    "provider call timed out"
                );
                Err(WeatherError::Timeout(self.request_timeout))
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome<'a, T> {
    Ok(&'a T),
    Error(String),
}

fn serialize_outcome<T, S>(
    value: &Result<T, WeatherError>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Ok(v) => Outcome::Ok(v),
        Err(e) => Outcome::Error(e.to_string()),
    }
    .serialize(serializer)
}
