//! Chart series derived from the daily forecast.
//!
//! Both builders are 1:1, order-preserving maps over the daily list.

use crate::helpers::day_label;
use crate::models::{DailyForecast, RainProbabilityPoint, TemperatureSeriesPoint};

/// Temperature per day. Days without a temperature are drawn at zero.
pub fn build_temperature_series(daily: &[DailyForecast]) -> Vec<TemperatureSeriesPoint> {
    daily
        .iter()
        .map(|d| TemperatureSeriesPoint {
            date: d.date,
            day_label: day_label(d.date),
            value: d.temperature.unwrap_or(0.0),
        })
        .collect()
}

/// Rain probability per day, in whole percent.
pub fn build_rain_series(daily: &[DailyForecast]) -> Vec<RainProbabilityPoint> {
    daily
        .iter()
        .map(|d| RainProbabilityPoint {
            date: d.date,
            day_label: day_label(d.date),
            probability_percent: probability_percent(d.precipitation_probability01),
        })
        .collect()
}

/// `p * 100` truncated toward zero, kept within 0..=100.
fn probability_percent(p: f64) -> u8 {
    if !p.is_finite() {
        return 0;
    }
    (p * 100.0).clamp(0.0, 100.0) as u8
}
