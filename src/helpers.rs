//! Shared display helpers.
//!
//! Missing readings render as `"-"` on cards. Charts are the exception: they
//! draw missing temperatures as zero (see `services::series`).

use chrono::{DateTime, Datelike, FixedOffset};

use crate::models::UnitSystem;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Placeholder for a missing reading.
pub(crate) const MISSING: &str = "-";

/// Upper-case the first character, leave the rest untouched.
///
/// Not a title-case: `"light rain"` becomes `"Light rain"`.
pub(crate) fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Image URL for a provider icon id (e.g. `"10d"`). Empty ids have no image.
pub(crate) fn icon_url(icon_id: Option<&str>) -> Option<String> {
    icon_id
        .filter(|id| !id.is_empty())
        .map(|id| format!("{}/{}@4x.png", ICON_BASE_URL, id))
}

pub(crate) fn format_temperature(value: Option<f64>, units: UnitSystem) -> String {
    match value {
        Some(v) => format!("{:.1}{}", v, units.temperature_symbol()),
        None => MISSING.to_string(),
    }
}

pub(crate) fn format_wind(value: Option<f64>, units: UnitSystem) -> String {
    match value {
        Some(v) => format!("{:.1} {}", v, units.wind_unit()),
        None => MISSING.to_string(),
    }
}

/// `"17 Oct 2026, 06:42"`, or `"-"` when absent.
pub(crate) fn format_datetime(dt: Option<DateTime<FixedOffset>>) -> String {
    match dt {
        Some(dt) => dt.format("%d %b %Y, %H:%M").to_string(),
        None => MISSING.to_string(),
    }
}

/// Abbreviated weekday name used as chart and card label (`"Mon"`).
pub(crate) fn day_label(date: impl Datelike) -> String {
    date.weekday().to_string()
}

/// Render an optional reading with a unit suffix, or `"-"`.
pub(crate) fn or_dash(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{}{}", v, suffix),
        None => MISSING.to_string(),
    }
}
