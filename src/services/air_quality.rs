//! Air-quality summary.
//!
//! Air quality is supplementary: every failure becomes a summary with no
//! index and a label saying why, never an error.

use std::collections::BTreeMap;

use crate::models::AirQualitySummary;
use crate::services::openweather::{AirQualityReading, WeatherProvider};

/// Pollutants shown on the card, in display order.
pub const POLLUTANTS: [&str; 6] = ["pm10", "pm2_5", "o3", "co", "so2", "no2"];

pub const LABEL_NO_DATA: &str = "no data";
pub const LABEL_CONNECTION_FAILED: &str = "connection failed";
pub const LABEL_SERVICE_UNAVAILABLE: &str = "service unavailable";

/// Fixed label for an AQI value; `None` outside 1..=5.
pub fn aqi_label(index: i64) -> Option<&'static str> {
    match index {
        1 => Some("Good"),
        2 => Some("Fair"),
        3 => Some("Moderate"),
        4 => Some("Poor"),
        5 => Some("Very Poor"),
        _ => None,
    }
}

impl AirQualitySummary {
    fn empty(label: &'static str) -> Self {
        Self {
            index: None,
            label,
            components: BTreeMap::new(),
        }
    }

    pub fn no_data() -> Self {
        Self::empty(LABEL_NO_DATA)
    }

    pub fn from_reading(reading: AirQualityReading) -> Self {
        match reading {
            AirQualityReading::ConnectionFailed => Self::empty(LABEL_CONNECTION_FAILED),
            AirQualityReading::Unavailable => Self::empty(LABEL_SERVICE_UNAVAILABLE),
            AirQualityReading::Sample { index, components } => {
                let components = components
                    .into_iter()
                    .filter(|(code, _)| POLLUTANTS.contains(&code.as_str()))
                    .collect();
                // An index outside the table is as good as no index.
                match index.and_then(|i| aqi_label(i).map(|label| (i, label))) {
                    Some((i, label)) => Self {
                        index: u8::try_from(i).ok(),
                        label,
                        components,
                    },
                    None => Self {
                        index: None,
                        label: LABEL_NO_DATA,
                        components,
                    },
                }
            }
        }
    }
}

/// Look up air quality for the given coordinates.
///
/// Without both coordinates the provider is not called at all.
pub async fn resolve_air_quality(
    provider: &dyn WeatherProvider,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> AirQualitySummary {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => {
            AirQualitySummary::from_reading(provider.fetch_air_quality(lat, lon).await)
        }
        _ => {
            tracing::debug!("No coordinates for air quality lookup, skipping");
            AirQualitySummary::no_data()
        }
    }
}
