//! Daily forecast aggregation.
//!
//! The provider delivers 3-hour slots (8 per day, ~40 for five days). The
//! dashboard shows one card per calendar day, so each day is represented by
//! a single slot:
//!
//! 1. the first slot starting at 12:00 local time, or
//! 2. if the day has no noon slot, the slot at index `len / 2`.
//!
//! Dates and hours are read in whatever offset the timestamps carry; no
//! timezone conversion happens here.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike};

use crate::helpers::capitalize_first;
use crate::models::{DailyForecast, RawForecastSample};

/// Local hour preferred as the day's representative slot.
const REPRESENTATIVE_HOUR: u32 = 12;

/// Collapse 3-hour samples into one forecast per calendar day, ascending by date.
pub fn aggregate_daily(samples: &[RawForecastSample]) -> Vec<DailyForecast> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&RawForecastSample>> = BTreeMap::new();
    for sample in samples {
        by_date
            .entry(sample.timestamp.date_naive())
            .or_default()
            .push(sample);
    }

    let mut daily: Vec<DailyForecast> = by_date
        .values()
        .filter_map(|group| representative_sample(group))
        .map(to_daily_forecast)
        .collect();

    // BTreeMap already iterates in date order; sort anyway so the output
    // order never depends on the grouping container.
    daily.sort_by_key(|d| d.date);
    daily
}

/// Pick the slot that stands in for a whole day. `None` only for an empty group.
fn representative_sample<'a>(group: &[&'a RawForecastSample]) -> Option<&'a RawForecastSample> {
    group
        .iter()
        .find(|s| s.timestamp.hour() == REPRESENTATIVE_HOUR)
        .or_else(|| group.get(group.len() / 2))
        .copied()
}

fn to_daily_forecast(sample: &RawForecastSample) -> DailyForecast {
    DailyForecast {
        date: sample.timestamp.date_naive(),
        temperature: sample.temperature,
        description: capitalize_first(&sample.condition_text),
        icon_id: sample.condition_icon_id.clone(),
        precipitation_probability01: sample.precipitation_probability,
    }
}
