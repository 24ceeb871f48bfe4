use std::time::Duration;

/// Failures surfaced by the gateway, the normalizer and the service.
///
/// The KPI engine never produces one of these; it degrades to an empty
/// [`KpiSet`](crate::KpiSet) instead.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("API key rejected: check that it is valid and activated")]
    Authentication,

    #[error("Too many requests: wait before trying again")]
    RateLimited,

    #[error("Provider request failed with status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Provider request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Provider request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed provider payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid coordinate ({latitude}, {longitude}): latitude or longitude out of range")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

impl WeatherError {
    /// True for the generic upstream failures: non-auth HTTP errors, transport
    /// errors and timeouts.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            WeatherError::UpstreamStatus { .. }
                | WeatherError::Network(_)
                | WeatherError::Timeout(_)
        )
    }
}
