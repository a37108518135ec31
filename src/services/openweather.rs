//! OpenWeatherMap 2.5 client.
//!
//! Fetches current conditions, the 5-day / 3-hour forecast and air pollution
//! data. See: https://openweathermap.org/api
//!
//! Payloads are deserialized into structs whose fields are all optional, so a
//! missing field and an explicit `null` look the same to the rest of the crate.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::{is_configured_key, AppConfig};
use crate::errors::AppError;
use crate::helpers::capitalize_first;
use crate::models::{CurrentConditions, RawForecastSample, UnitSystem};

/// Source of weather data for the dashboard.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions for a location such as `"London,UK"`.
    async fn fetch_current(
        &self,
        location: &str,
        units: UnitSystem,
        language: &str,
    ) -> Result<CurrentConditions, AppError>;

    /// 3-hour forecast slots, in provider order.
    async fn fetch_forecast(
        &self,
        location: &str,
        units: UnitSystem,
        language: &str,
    ) -> Result<Vec<RawForecastSample>, AppError>;

    /// Latest air pollution sample. Never fails: problems are reported as
    /// `ConnectionFailed` / `Unavailable` so the dashboard can still render.
    async fn fetch_air_quality(&self, latitude: f64, longitude: f64) -> AirQualityReading;
}

/// Outcome of an air pollution lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum AirQualityReading {
    /// HTTP 200. Either field may be empty if the payload had no data.
    Sample {
        index: Option<i64>,
        components: BTreeMap<String, f64>,
    },
    /// Network error or timeout.
    ConnectionFailed,
    /// Non-2xx status or unreadable body.
    Unavailable,
}

/// The three endpoints used, with the wording of their error messages.
#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Current,
    Forecast,
    AirPollution,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
            Endpoint::AirPollution => "air_pollution",
        }
    }

    fn connect_error(self) -> &'static str {
        match self {
            Endpoint::Current => "Could not connect to the weather service",
            Endpoint::Forecast => "Could not fetch the weather forecast",
            Endpoint::AirPollution => "Could not fetch air quality data",
        }
    }

    fn api_error(self) -> &'static str {
        match self {
            Endpoint::Current => "Weather API error",
            Endpoint::Forecast => "Forecast API error",
            Endpoint::AirPollution => "Air quality API error",
        }
    }
}

/// Client for the OpenWeatherMap API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

// --- OpenWeatherMap JSON response types ---

#[derive(Debug, Deserialize)]
struct OwmErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    name: Option<String>,
    dt: Option<i64>,
    /// Shift in seconds from UTC.
    timezone: Option<i32>,
    coord: Option<OwmCoord>,
    weather: Option<Vec<OwmCondition>>,
    main: Option<OwmMain>,
    wind: Option<OwmWind>,
    sys: Option<OwmSys>,
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmCoord {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    pressure: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Option<Vec<OwmForecastItem>>,
    city: Option<OwmCity>,
}

#[derive(Debug, Deserialize)]
struct OwmCity {
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: Option<i64>,
    main: Option<OwmMain>,
    weather: Option<Vec<OwmCondition>>,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmAirResponse {
    list: Option<Vec<OwmAirItem>>,
}

#[derive(Debug, Deserialize)]
struct OwmAirItem {
    main: Option<OwmAirMain>,
    components: Option<BTreeMap<String, Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct OwmAirMain {
    aqi: Option<i64>,
}

impl OpenWeatherClient {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Reject requests that can't succeed, before touching the network.
    fn validate_request(&self, location: &str) -> Result<(), AppError> {
        require_location(location)?;
        if !is_configured_key(&self.api_key) {
            return Err(AppError::Validation(
                "API key not configured. Set the OPENWEATHER_API_KEY environment variable."
                    .to_string(),
            ));
        }
        Ok(())
    }

    fn location_query(
        &self,
        location: &str,
        units: UnitSystem,
        language: &str,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("q", location.trim().to_string()),
            ("appid", self.api_key.clone()),
            ("units", units.as_str().to_string()),
            ("lang", language.to_string()),
        ]
    }

    /// GET an endpoint and decode a 2xx JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &[(&'static str, String)],
    ) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                AppError::Upstream(format!(
                    "{}: {}",
                    endpoint.connect_error(),
                    describe_request_error(e)
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("OpenWeatherMap {} returned HTTP {}", endpoint.path(), status);
            return Err(AppError::Upstream(format!(
                "{}: {}",
                endpoint.api_error(),
                error_message(&body)
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::Upstream(format!(
                "{}: unreadable response ({})",
                endpoint.api_error(),
                describe_request_error(e)
            ))
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch_current(
        &self,
        location: &str,
        units: UnitSystem,
        language: &str,
    ) -> Result<CurrentConditions, AppError> {
        self.validate_request(location)?;
        tracing::debug!("Fetching current weather for '{}' ({})", location, units.as_str());

        let query = self.location_query(location, units, language);
        let raw: OwmCurrentResponse = self.get_json(Endpoint::Current, &query).await?;
        parse_current(raw, units)
    }

    async fn fetch_forecast(
        &self,
        location: &str,
        units: UnitSystem,
        language: &str,
    ) -> Result<Vec<RawForecastSample>, AppError> {
        self.validate_request(location)?;
        tracing::debug!("Fetching forecast for '{}' ({})", location, units.as_str());

        let query = self.location_query(location, units, language);
        let raw: OwmForecastResponse = self.get_json(Endpoint::Forecast, &query).await?;
        parse_forecast(raw)
    }

    async fn fetch_air_quality(&self, latitude: f64, longitude: f64) -> AirQualityReading {
        tracing::debug!("Fetching air quality for ({}, {})", latitude, longitude);
        let url = format!("{}/{}", self.base_url, Endpoint::AirPollution.path());
        let query = [
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("appid", self.api_key.clone()),
        ];

        let response = match self.client.get(&url).query(&query).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    "{}: {}",
                    Endpoint::AirPollution.connect_error(),
                    describe_request_error(e)
                );
                return AirQualityReading::ConnectionFailed;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                "{}: HTTP {}",
                Endpoint::AirPollution.api_error(),
                response.status()
            );
            return AirQualityReading::Unavailable;
        }

        match response.json::<OwmAirResponse>().await {
            Ok(raw) => parse_air_quality(raw),
            Err(e) => {
                tracing::warn!(
                    "{}: unreadable response ({})",
                    Endpoint::AirPollution.api_error(),
                    describe_request_error(e)
                );
                AirQualityReading::Unavailable
            }
        }
    }
}

/// The trimmed location, or a validation error when it is blank.
pub(crate) fn require_location(location: &str) -> Result<&str, AppError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(AppError::Validation(
            "Please enter a city to look up the weather.".to_string(),
        ));
    }
    Ok(location)
}

/// Human-readable reason for a failed request, without the URL (it carries the API key).
fn describe_request_error(e: reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.without_url().to_string()
    }
}

/// Pick the `message` field of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<OwmErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| "unknown error".to_string())
}

fn utc_offset(shift_secs: Option<i32>) -> FixedOffset {
    shift_secs
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Unix seconds to local time. Zero is how the API reports "no value".
fn local_time(unix_secs: Option<i64>, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    unix_secs
        .filter(|&t| t != 0)
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .map(|dt| dt.with_timezone(&offset))
}

fn first_condition(conditions: Option<Vec<OwmCondition>>) -> (String, Option<String>) {
    match conditions.and_then(|c| c.into_iter().next()) {
        Some(c) => (
            c.description.unwrap_or_default(),
            c.icon.filter(|i| !i.is_empty()),
        ),
        None => (String::new(), None),
    }
}

fn parse_current(raw: OwmCurrentResponse, units: UnitSystem) -> Result<CurrentConditions, AppError> {
    let city = raw.name.ok_or_else(|| {
        AppError::IncompleteResponse("Incomplete response from the weather API.".to_string())
    })?;

    let offset = utc_offset(raw.timezone);
    let (description, icon_id) = first_condition(raw.weather);
    let main = raw.main;
    let main_field = |f: fn(&OwmMain) -> Option<f64>| main.as_ref().and_then(f);
    let (country, sunrise, sunset) = match raw.sys {
        Some(sys) => (
            sys.country.filter(|c| !c.is_empty()),
            local_time(sys.sunrise, offset),
            local_time(sys.sunset, offset),
        ),
        None => (None, None, None),
    };

    Ok(CurrentConditions {
        city,
        country,
        temperature: main_field(|m| m.temp),
        temperature_min: main_field(|m| m.temp_min),
        temperature_max: main_field(|m| m.temp_max),
        feels_like: main_field(|m| m.feels_like),
        description: capitalize_first(&description),
        icon_id,
        humidity: main_field(|m| m.humidity),
        wind_speed: raw.wind.and_then(|w| w.speed),
        pressure: main_field(|m| m.pressure),
        visibility: raw.visibility,
        observed_at: local_time(raw.dt, offset),
        sunrise,
        sunset,
        latitude: raw.coord.as_ref().and_then(|c| c.lat),
        longitude: raw.coord.as_ref().and_then(|c| c.lon),
        units,
    })
}

fn parse_forecast(raw: OwmForecastResponse) -> Result<Vec<RawForecastSample>, AppError> {
    let offset = utc_offset(raw.city.and_then(|c| c.timezone));

    raw.list
        .unwrap_or_default()
        .into_iter()
        .map(|item| {
            let timestamp = local_time(item.dt, offset).ok_or_else(|| {
                AppError::IncompleteResponse(
                    "Incomplete forecast from the weather API: entry without time.".to_string(),
                )
            })?;
            let (condition_text, condition_icon_id) = first_condition(item.weather);
            Ok(RawForecastSample {
                timestamp,
                temperature: item.main.and_then(|m| m.temp),
                condition_text,
                condition_icon_id,
                precipitation_probability: item.pop.unwrap_or(0.0).clamp(0.0, 1.0),
            })
        })
        .collect()
}

fn parse_air_quality(raw: OwmAirResponse) -> AirQualityReading {
    let first = raw.list.and_then(|l| l.into_iter().next());
    let (index, components) = match first {
        Some(item) => (
            item.main.and_then(|m| m.aqi),
            item.components
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v)))
                .collect(),
        ),
        None => (None, BTreeMap::new()),
    };
    AirQualityReading::Sample { index, components }
}
