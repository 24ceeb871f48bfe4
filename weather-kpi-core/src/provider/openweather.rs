use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Coordinate, ResourceKind, WeatherError};

use super::WeatherGateway;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_GEO_BASE_URL: &str = "https://api.openweathermap.org/geo/1.0";

/// OpenWeatherMap client for the `weather`, `forecast` and direct geocoding
/// endpoints. Units are always metric.
#[derive(Debug, Clone)]
pub struct OpenWeatherGateway {
    api_key: String,
    base_url: String,
    geo_base_url: String,
    timeout: Duration,
    http: Client,
}

/// One result of a place-name search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoMatch {
    pub name: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub coordinate: Coordinate,
}

impl GeoMatch {
    /// "Name, State, Country" with missing parts skipped.
    pub fn label(&self) -> String {
        [Some(self.name.as_str()), self.state.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl OpenWeatherGateway {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, WeatherError> {
        Self::with_base_urls(api_key, timeout, DEFAULT_BASE_URL, DEFAULT_GEO_BASE_URL)
    }

    /// Point the gateway at other hosts, e.g. a proxy or a mock server.
    pub fn with_base_urls(
        api_key: String,
        timeout: Duration,
        base_url: &str,
        geo_base_url: &str,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build().map_err(WeatherError::Network)?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            geo_base_url: geo_base_url.trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    /// Look up places matching `query` through the direct geocoding endpoint.
    pub async fn search_locations(
        &self,
        query: &str,
        limit: u8,
    ) -> Result<Vec<GeoMatch>, WeatherError> {
        let url = format!("{}/direct", self.geo_base_url);
        let limit = limit.to_string();

        let params = [
            ("q", query),
            ("limit", limit.as_str()),
            ("appid", self.api_key.as_str()),
        ];
        let body = self.get_json(&url, &params).await?;

        let entries: Vec<OwGeoEntry> = serde_json::from_value(body)
            .map_err(|e| WeatherError::MalformedPayload(format!("geocoding: {e}")))?;

        // Entries with impossible coordinates are skipped rather than failing the search.
        let matches: Vec<GeoMatch> = entries
            .into_iter()
            .filter_map(|e| {
                let coordinate = Coordinate::new(e.lat, e.lon).ok()?;
                Some(GeoMatch {
                    name: e.name,
                    state: e.state,
                    country: e.country,
                    coordinate,
                })
            })
            .collect();

        tracing::debug!(query, found = matches.len(), "geocoding search finished");
        Ok(matches)
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, WeatherError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| self.transport_error(e))?;

        match status {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(WeatherError::Authentication),
            StatusCode::TOO_MANY_REQUESTS => return Err(WeatherError::RateLimited),
            s => {
                return Err(WeatherError::UpstreamStatus {
                    status: s.as_u16(),
                    body: truncate_body(&body),
                });
            }
        }

        serde_json::from_str(&body)
            .map_err(|e| WeatherError::MalformedPayload(format!("response is not JSON: {e}")))
    }

    fn transport_error(&self, err: reqwest::Error) -> WeatherError {
        if err.is_timeout() {
            WeatherError::Timeout(self.timeout)
        } else {
            WeatherError::Network(err)
        }
    }
}

#[async_trait]
impl WeatherGateway for OpenWeatherGateway {
    async fn fetch(
        &self,
        kind: ResourceKind,
        coordinate: Coordinate,
    ) -> Result<Value, WeatherError> {
        let endpoint = match kind {
            ResourceKind::Current => "weather",
            ResourceKind::Forecast => "forecast",
        };
        let url = format!("{}/{}", self.base_url, endpoint);
        let lat = coordinate.latitude().to_string();
        let lon = coordinate.longitude().to_string();

        tracing::debug!(%kind, %coordinate, "requesting OpenWeather");

        self.get_json(
            &url,
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ],
        )
        .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
