//! Metric conversions and the one-decimal rounding shared by the normalizer
//! and the KPI engine.

const MPS_TO_KMH: f64 = 3.6;

/// Round to one decimal place, ties to even (`0.25 -> 0.2`, `0.75 -> 0.8`).
///
/// Rounding works on the exact stored value, so `0.35` (stored just below)
/// gives `0.3` and `0.45` (stored just above) gives `0.5`. Scaling by ten
/// first would turn those into false ties.
pub fn round1(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

/// Meters per second to kilometers per hour, rounded to one decimal.
pub fn mps_to_kmh(mps: f64) -> f64 {
    round1(mps * MPS_TO_KMH)
}

/// Uppercase the first character and leave the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
