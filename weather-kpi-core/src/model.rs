use std::{
    collections::BTreeMap,
    fmt,
    hash::{Hash, Hasher},
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{WeatherError, units::round1};

/// A validated (latitude, longitude) pair.
///
/// Equality and hashing compare the bit patterns of both components, so two
/// coordinates share a cache line only if they are exactly the same numbers.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WeatherError> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);

        if !lat_ok || !lon_ok {
            return Err(WeatherError::InvalidCoordinate { latitude, longitude });
        }

        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Which provider resource a request or cache line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Current,
    Forecast,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Current => "current",
            ResourceKind::Forecast => "forecast",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions at a coordinate, in metric units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentObservation {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
    pub city: String,
    /// When the payload was normalized, not the provider's measurement time.
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub description: String,
}

/// Forecast points in provider order. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ForecastSeries {
    points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    /// Returns `None` for an empty vector.
    pub fn new(points: Vec<ForecastPoint>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; a series is never empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForecastPoint> {
        self.points.iter()
    }

    /// How often each description occurs, most frequent first, ties by name.
    pub fn condition_counts(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for p in &self.points {
            *counts.entry(p.description.as_str()).or_default() += 1;
        }

        let mut out: Vec<(String, usize)> =
            counts.into_iter().map(|(name, n)| (name.to_string(), n)).collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// One summary per UTC calendar date, in date order.
    pub fn daily_summaries(&self) -> Vec<DailySummary> {
        let mut days: BTreeMap<NaiveDate, Vec<&ForecastPoint>> = BTreeMap::new();
        for p in &self.points {
            days.entry(p.timestamp.date_naive()).or_default().push(p);
        }

        days.into_iter()
            .map(|(date, points)| {
                let min_temp = points.iter().map(|p| p.temperature).fold(f64::INFINITY, f64::min);
                let max_temp =
                    points.iter().map(|p| p.temperature).fold(f64::NEG_INFINITY, f64::max);
                let humidity_sum: f64 = points.iter().map(|p| f64::from(p.humidity)).sum();
                let max_wind_speed = points.iter().map(|p| p.wind_speed).fold(0.0, f64::max);

                DailySummary {
                    date,
                    min_temp,
                    max_temp,
                    avg_humidity: round1(humidity_sum / points.len() as f64),
                    max_wind_speed,
                    points: points.len(),
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ForecastSeries {
    type Item = &'a ForecastPoint;
    type IntoIter = std::slice::Iter<'a, ForecastPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Per-day rollup of a forecast, for tabular display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub min_temp: f64,
    pub max_temp: f64,
    pub avg_humidity: f64,
    pub max_wind_speed: f64,
    pub points: usize,
}

/// Derived indicators for a dashboard.
///
/// `KpiSet::default()` is the empty set returned when an input is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSet {
    pub current_temp: Option<f64>,
    pub temp_trend: f64,
    pub avg_humidity: f64,
    pub max_wind_speed: f64,
    pub weather_stability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn point(hour_offset: i64, temperature: f64, humidity: u8, description: &str) -> ForecastPoint {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        ForecastPoint {
            timestamp: base + chrono::Duration::hours(hour_offset),
            temperature,
            humidity,
            wind_speed: 10.0 + hour_offset as f64,
            description: description.to_string(),
        }
    }

    #[test]
    fn coordinate_rejects_out_of_range() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(matches!(
            Coordinate::new(90.1, 0.0),
            Err(WeatherError::InvalidCoordinate { .. })
        ));
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn coordinate_identity_is_bitwise() {
        let a = Coordinate::new(51.5074, -0.1278).unwrap();
        let b = Coordinate::new(51.5074, -0.1278).unwrap();
        let c = Coordinate::new(51.50740001, -0.1278).unwrap();
        let zero = Coordinate::new(0.0, 0.0).unwrap();
        let neg_zero = Coordinate::new(-0.0, 0.0).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(zero, neg_zero);

        let set: HashSet<Coordinate> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn empty_series_is_not_constructible() {
        assert!(ForecastSeries::new(Vec::new()).is_none());
        let series = ForecastSeries::new(vec![point(0, 1.0, 50, "Clear")]).unwrap();
        assert_eq!(series.len(), 1);
        assert!(!series.is_empty());
    }

    #[test]
    fn condition_counts_orders_by_frequency_then_name() {
        let series = ForecastSeries::new(vec![
            point(0, 1.0, 50, "Light rain"),
            point(3, 1.0, 50, "Clear sky"),
            point(6, 1.0, 50, "Light rain"),
            point(9, 1.0, 50, "Broken clouds"),
        ])
        .unwrap();

        assert_eq!(
            series.condition_counts(),
            vec![
                ("Light rain".to_string(), 2),
                ("Broken clouds".to_string(), 1),
                ("Clear sky".to_string(), 1),
            ]
        );
    }

    #[test]
    fn daily_summaries_group_by_utc_date() {
        let series = ForecastSeries::new(vec![
            point(18, 4.0, 60, "Clear"),
            point(21, 2.0, 70, "Clear"),
            point(24, 8.0, 81, "Clear"),
        ])
        .unwrap();

        let days = series.daily_summaries();
        assert_eq!(days.len(), 2);

        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(days[0].min_temp, 2.0);
        assert_eq!(days[0].max_temp, 4.0);
        assert_eq!(days[0].avg_humidity, 65.0);
        assert_eq!(days[0].max_wind_speed, 31.0);
        assert_eq!(days[0].points, 2);

        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(days[1].points, 1);
    }

    #[test]
    fn empty_kpi_set_is_default() {
        let kpis = KpiSet::default();
        assert_eq!(kpis.current_temp, None);
        assert_eq!(kpis.temp_trend, 0.0);
        assert_eq!(kpis.avg_humidity, 0.0);
        assert_eq!(kpis.max_wind_speed, 0.0);
        assert_eq!(kpis.weather_stability, 0.0);
    }
}
