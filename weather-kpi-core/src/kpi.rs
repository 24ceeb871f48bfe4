//! Reduces a current observation and a forecast series into dashboard KPIs.

use crate::{
    model::{CurrentObservation, ForecastSeries, KpiSet},
    units::round1,
};

/// Points per trend window; about one day at the provider's 3-hour cadence.
const TREND_WINDOW: usize = 8;

const TEMP_VARIANCE_SCALE: f64 = 10.0;
const HUMIDITY_VARIANCE_SCALE: f64 = 100.0;

/// Compute the KPI set. Returns [`KpiSet::default()`] when either input is
/// missing.
pub fn compute_kpis(
    current: Option<&CurrentObservation>,
    forecast: Option<&ForecastSeries>,
) -> KpiSet {
    let (Some(current), Some(forecast)) = (current, forecast) else {
        return KpiSet::default();
    };

    let temps: Vec<f64> = forecast.iter().map(|p| p.temperature).collect();
    let humidity: Vec<f64> = forecast.iter().map(|p| f64::from(p.humidity)).collect();

    let max_wind_speed =
        forecast.iter().map(|p| p.wind_speed).fold(None, |acc: Option<f64>, w| {
            Some(acc.map_or(w, |m| m.max(w)))
        });

    KpiSet {
        current_temp: Some(current.temperature),
        temp_trend: temperature_trend(&temps),
        avg_humidity: round1(mean(&humidity)),
        max_wind_speed: round1(max_wind_speed.unwrap_or(0.0)),
        weather_stability: weather_stability(&temps, &humidity),
    }
}

/// Mean of the last window minus mean of the first window. Windows clamp to
/// the series length and overlap on short series.
fn temperature_trend(temps: &[f64]) -> f64 {
    if temps.len() < 2 {
        return 0.0;
    }

    let head = &temps[..TREND_WINDOW.min(temps.len())];
    let tail = &temps[temps.len().saturating_sub(TREND_WINDOW)..];

    round1(mean(tail) - mean(head))
}

fn weather_stability(temps: &[f64], humidity: &[f64]) -> f64 {
    let temp_stability = 100.0 / (1.0 + variance(temps) / TEMP_VARIANCE_SCALE);
    let humidity_stability = 100.0 / (1.0 + variance(humidity) / HUMIDITY_VARIANCE_SCALE);

    round1((temp_stability + humidity_stability) / 2.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance; 0 for fewer than two values.
fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}
