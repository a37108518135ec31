//! Dashboard domain types.
//!
//! Everything here is built fresh for each dashboard fetch and never mutated
//! afterwards. HTTP response shapes live in `routes::dashboard`.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unit convention applied to temperature and wind speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// °C, m/s
    #[default]
    Metric,
    /// °F, mph
    Imperial,
}

impl UnitSystem {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Some(Self::Metric),
            "imperial" => Some(Self::Imperial),
            _ => None,
        }
    }

    /// Value of the provider's `units` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }

    pub fn wind_unit(self) -> &'static str {
        match self {
            Self::Metric => "m/s",
            Self::Imperial => "mph",
        }
    }
}

/// Current conditions for the searched location.
///
/// Only `city` is guaranteed; every reading may be missing from the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub city: String,
    pub country: Option<String>,
    pub temperature: Option<f64>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub feels_like: Option<f64>,
    /// Condition text, first letter capitalized.
    pub description: String,
    pub icon_id: Option<String>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    /// Sea-level pressure in hPa.
    pub pressure: Option<f64>,
    /// Visibility in metres.
    pub visibility: Option<f64>,
    pub observed_at: Option<DateTime<FixedOffset>>,
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub units: UnitSystem,
}

/// One 3-hour forecast slot as delivered by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RawForecastSample {
    /// Slot start, expressed in the location's UTC offset.
    pub timestamp: DateTime<FixedOffset>,
    pub temperature: Option<f64>,
    pub condition_text: String,
    pub condition_icon_id: Option<String>,
    /// Probability of precipitation, 0.0..=1.0.
    pub precipitation_probability: f64,
}

/// The representative forecast for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature: Option<f64>,
    pub description: String,
    pub icon_id: Option<String>,
    pub precipitation_probability01: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSeriesPoint {
    pub date: NaiveDate,
    pub day_label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RainProbabilityPoint {
    pub date: NaiveDate,
    pub day_label: String,
    pub probability_percent: u8,
}

/// Air-quality summary shown next to the forecast.
///
/// `index` is `None` when there is nothing to show; `label` then says why.
#[derive(Debug, Clone, PartialEq)]
pub struct AirQualitySummary {
    pub index: Option<u8>,
    pub label: &'static str,
    /// Pollutant code (`pm10`, `pm2_5`, ...) to concentration in µg/m³.
    pub components: BTreeMap<String, f64>,
}

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub location: String,
    pub units: UnitSystem,
    pub current: CurrentConditions,
    pub daily: Vec<DailyForecast>,
    pub temperature_series: Vec<TemperatureSeriesPoint>,
    pub rain_series: Vec<RainProbabilityPoint>,
    pub air_quality: AirQualitySummary,
    pub generated_at: DateTime<Utc>,
}
