use std::fmt::Write;

use weather_kpi_core::{CurrentObservation, Dashboard, ForecastSeries, GeoMatch, KpiSet};

const TEMPERATURE_UNIT: &str = "°C";
const WIND_SPEED_UNIT: &str = "km/h";
const PRESSURE_UNIT: &str = "hPa";

/// Render a dashboard as plain text. Sections whose data failed to load are
/// replaced by the error message.
pub fn dashboard(label: &str, dash: &Dashboard) -> String {
    let mut out = String::new();

    let place = match &dash.current {
        Ok(current) => current.city.as_str(),
        Err(_) => label,
    };
    let _ = writeln!(out, "{place} ({})", dash.coordinate);
    out.push('\n');

    match &dash.current {
        Ok(current) => out.push_str(&current_section(current)),
        Err(e) => {
            let _ = writeln!(out, "Current conditions unavailable: {e}");
        }
    }
    out.push('\n');

    if dash.current.is_ok() && dash.forecast.is_ok() {
        out.push_str(&kpi_section(&dash.kpis));
        out.push('\n');
    }

    match &dash.forecast {
        Ok(forecast) => {
            out.push_str(&detailed_section(forecast));
            out.push('\n');
            out.push_str(&daily_section(forecast));
            out.push('\n');
            out.push_str(&conditions_section(forecast));
        }
        Err(e) => {
            let _ = writeln!(out, "Forecast unavailable: {e}");
        }
    }

    out
}

fn current_section(c: &CurrentObservation) -> String {
    let mut out = String::new();
    let observed = c.observed_at.format("%Y-%m-%d %H:%M:%S UTC");
    let _ = writeln!(out, "Current conditions ({observed})");
    let _ = writeln!(
        out,
        "  Temperature  {:.1}{TEMPERATURE_UNIT} (feels like {:.1}{TEMPERATURE_UNIT})",
        c.temperature, c.feels_like
    );
    let _ = writeln!(out, "  Conditions   {} [{}]", c.description, c.icon);
    let _ = writeln!(out, "  Humidity     {}%", c.humidity);
    let _ = writeln!(out, "  Pressure     {} {PRESSURE_UNIT}", c.pressure);
    let _ = writeln!(out, "  Wind         {:.1} {WIND_SPEED_UNIT}", c.wind_speed);
    out
}

fn kpi_section(k: &KpiSet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Key weather metrics");
    if let Some(temp) = k.current_temp {
        let _ = writeln!(
            out,
            "  Temperature  {temp:.1}{TEMPERATURE_UNIT} (trend {}{TEMPERATURE_UNIT})",
            signed(k.temp_trend)
        );
    }
    let _ = writeln!(out, "  Humidity     {:.1}% avg", k.avg_humidity);
    let _ = writeln!(out, "  Wind         {:.1} {WIND_SPEED_UNIT} max", k.max_wind_speed);
    let _ = writeln!(out, "  Stability    {:.1}/100", k.weather_stability);
    out
}

/// One row per forecast point in provider order; the temperature column
/// doubles as the over-time view.
fn detailed_section(forecast: &ForecastSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Forecast ({} points)", forecast.len());
    let _ = writeln!(
        out,
        "  {:<16}  {:>7}  {:>8}  {:>7}  {}",
        "time (UTC)", "temp", "humidity", "wind", "conditions"
    );
    for p in forecast {
        let _ = writeln!(
            out,
            "  {:<16}  {:>7.1}  {:>7}%  {:>7.1}  {}",
            p.timestamp.format("%Y-%m-%d %H:%M"),
            p.temperature,
            p.humidity,
            p.wind_speed,
            p.description
        );
    }
    out
}

fn daily_section(forecast: &ForecastSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Forecast by day");
    let _ = writeln!(
        out,
        "  {:<10}  {:>7}  {:>7}  {:>8}  {:>9}",
        "date", "min", "max", "humidity", "wind max"
    );
    for day in forecast.daily_summaries() {
        let _ = writeln!(
            out,
            "  {:<10}  {:>7.1}  {:>7.1}  {:>7.1}%  {:>9.1}",
            day.date.format("%Y-%m-%d"),
            day.min_temp,
            day.max_temp,
            day.avg_humidity,
            day.max_wind_speed
        );
    }
    out
}

fn conditions_section(forecast: &ForecastSeries) -> String {
    let mut out = String::new();
    let total = forecast.len() as f64;
    let _ = writeln!(out, "Weather conditions");
    for (description, count) in forecast.condition_counts() {
        let share = 100.0 * count as f64 / total;
        let _ = writeln!(out, "  {description:<24} {count:>3}  ({share:.0}%)");
    }
    out
}

pub fn locations(entries: &[(&str, f64, f64)]) -> String {
    let mut out = String::new();
    for (name, lat, lon) in entries {
        let _ = writeln!(out, "{name:<16} {lat:>9.4} {lon:>10.4}");
    }
    out
}

pub fn geo_matches(matches: &[GeoMatch]) -> String {
    if matches.is_empty() {
        return "No matching locations.\n".to_string();
    }

    let mut out = String::new();
    for (i, m) in matches.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {}  --lat {} --lon {}",
            i + 1,
            m.label(),
            m.coordinate.latitude(),
            m.coordinate.longitude()
        );
    }
    out
}

fn signed(value: f64) -> String {
    // -0.0 would otherwise print with a sign
    let value = if value == 0.0 { 0.0 } else { value };
    if value > 0.0 {
        format!("+{value:.1}")
    } else {
        format!("{value:.1}")
    }
}
