use anyhow::{Result, anyhow};
use weather_kpi_core::Coordinate;

/// Quick-select cities offered by the dashboard.
pub const DEFAULT_LOCATIONS: &[(&str, f64, f64)] = &[
    ("Hyderabad", 17.0725, 78.5777),
    ("Buffalo", 42.8867, -78.8784),
    ("Niagara Falls", 43.0844, -79.0615),
    ("New York", 40.7128, -74.0060),
    ("London", 51.5074, -0.1278),
    ("Tokyo", 35.6762, 139.6503),
    ("Paris", 48.8566, 2.3522),
    ("Sydney", -33.8688, 151.2093),
];

/// Look up a default location by name, ignoring case and surrounding spaces.
pub fn find(name: &str) -> Option<(&'static str, Coordinate)> {
    let wanted = name.trim();
    DEFAULT_LOCATIONS
        .iter()
        .find(|(n, _, _)| n.eq_ignore_ascii_case(wanted))
        .and_then(|&(n, lat, lon)| Coordinate::new(lat, lon).ok().map(|c| (n, c)))
}

/// Resolve either a named default location or an explicit lat/lon pair.
pub fn resolve(
    name: Option<&str>,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<(String, Coordinate)> {
    match (name, lat, lon) {
        (Some(name), None, None) => find(name).map(|(n, c)| (n.to_string(), c)).ok_or_else(|| {
            anyhow!(
                "Unknown location '{name}'.\n\
                 Hint: run `weather-kpi locations` to list the built-in names, or pass --lat/--lon."
            )
        }),
        (None, Some(lat), Some(lon)) => {
            let coordinate = Coordinate::new(lat, lon)?;
            Ok((coordinate.to_string(), coordinate))
        }
        (None, None, None) => Err(anyhow!("Pass a location name or both --lat and --lon.")),
        (Some(_), _, _) => Err(anyhow!("Pass either a location name or --lat/--lon, not both.")),
        (None, _, _) => Err(anyhow!("Both --lat and --lon are required.")),
    }
}
