//! Test doubles shared by the service and route tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{FixedOffset, TimeZone};

use crate::errors::AppError;
use crate::models::{CurrentConditions, RawForecastSample, UnitSystem};
use crate::services::openweather::{AirQualityReading, WeatherProvider};

/// In-memory provider counting every call.
pub(crate) struct FakeProvider {
    pub(crate) samples: Vec<RawForecastSample>,
    pub(crate) coordinates: Option<(f64, f64)>,
    pub(crate) fail_forecast: bool,
    pub(crate) delay: Option<Duration>,
    pub(crate) current_calls: AtomicUsize,
    pub(crate) forecast_calls: AtomicUsize,
    pub(crate) air_calls: AtomicUsize,
    pub(crate) in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

impl FakeProvider {
    pub(crate) fn new(samples: Vec<RawForecastSample>) -> Self {
        Self {
            samples,
            coordinates: Some((-34.61, -58.38)),
            fail_forecast: false,
            delay: None,
            current_calls: AtomicUsize::new(0),
            forecast_calls: AtomicUsize::new(0),
            air_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
            + self.forecast_calls.load(Ordering::SeqCst)
            + self.air_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn fetch_current(
        &self,
        location: &str,
        units: UnitSystem,
        _language: &str,
    ) -> Result<CurrentConditions, AppError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if location == "Atlantis" {
            return Err(AppError::Upstream("Weather API error: city not found".to_string()));
        }
        Ok(CurrentConditions {
            city: location.to_string(),
            country: None,
            temperature: Some(16.0),
            temperature_min: None,
            temperature_max: None,
            feels_like: None,
            description: "Clear sky".to_string(),
            icon_id: Some("01d".to_string()),
            humidity: Some(60.0),
            wind_speed: Some(3.0),
            pressure: Some(1013.0),
            visibility: Some(10000.0),
            observed_at: None,
            sunrise: None,
            sunset: None,
            latitude: self.coordinates.map(|c| c.0),
            longitude: self.coordinates.map(|c| c.1),
            units,
        })
    }

    async fn fetch_forecast(
        &self,
        _location: &str,
        _units: UnitSystem,
        _language: &str,
    ) -> Result<Vec<RawForecastSample>, AppError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_forecast {
            return Err(AppError::Upstream("Forecast API error: boom".to_string()));
        }
        Ok(self.samples.clone())
    }

    async fn fetch_air_quality(&self, _latitude: f64, _longitude: f64) -> AirQualityReading {
        self.air_calls.fetch_add(1, Ordering::SeqCst);
        AirQualityReading::Sample {
            index: Some(2),
            components: BTreeMap::from([("pm10".to_string(), 12.5)]),
        }
    }
}

pub(crate) fn slot(day: u32, hour: u32, temp: f64) -> RawForecastSample {
    RawForecastSample {
        timestamp: FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, day, hour, 0, 0)
            .unwrap(),
        temperature: Some(temp),
        condition_text: "few clouds".to_string(),
        condition_icon_id: Some("02d".to_string()),
        precipitation_probability: 0.2,
    }
}

/// Day 1: all eight slots, noon at 15.0°.
/// Day 2: the noon slot is missing; index 3 of the remaining seven is 09:00 at 18.0°.
pub(crate) fn two_day_fixture() -> Vec<RawForecastSample> {
    let mut samples: Vec<_> = [0, 3, 6, 9, 12, 15, 18, 21]
        .iter()
        .map(|&h| slot(17, h, if h == 12 { 15.0 } else { 10.0 }))
        .collect();
    samples.extend(
        [0, 3, 6, 9, 15, 18, 21]
            .iter()
            .map(|&h| slot(18, h, if h == 9 { 18.0 } else { 11.0 })),
    );
    samples
}

