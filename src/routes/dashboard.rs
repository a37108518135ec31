//! Dashboard HTTP endpoints.
//!
//! - GET /api/v1/dashboard?location=&units=&lang=
//! - GET /api/v1/dashboard/latest

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::errors::{AppError, ErrorResponse};
use crate::helpers::{
    day_label, format_datetime, format_temperature, format_wind, icon_url, or_dash, MISSING,
};
use crate::models::{self, UnitSystem};
use crate::services::air_quality::POLLUTANTS;
use crate::services::dashboard::{DashboardRequest, DashboardSession};

/// Shared application state for the HTTP handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) session: Arc<DashboardSession>,
    pub(crate) api_key_configured: bool,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DashboardQuery {
    /// City to show, e.g. "London,UK". Omit to refresh the current city.
    pub location: Option<String>,
    /// "metric" or "imperial". Omit to keep the current unit system.
    pub units: Option<String>,
    /// Language for condition descriptions, e.g. "es". Omit to keep the current one.
    pub lang: Option<String>,
}

impl DashboardQuery {
    fn into_request(self) -> Result<DashboardRequest, AppError> {
        let units = self
            .units
            .as_deref()
            .map(|u| {
                UnitSystem::parse(u).ok_or_else(|| {
                    AppError::Validation(format!(
                        "Unknown units '{}': expected 'metric' or 'imperial'",
                        u
                    ))
                })
            })
            .transpose()?;
        Ok(DashboardRequest {
            location: self.location,
            units,
            language: self.lang,
        })
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Current-conditions card.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentCard {
    pub city: String,
    pub country: Option<String>,
    pub temperature: Option<f64>,
    /// e.g. "21.7°C", or "-" when unknown
    pub temperature_display: String,
    pub feels_like_display: String,
    pub temperature_min_display: String,
    pub temperature_max_display: String,
    pub description: String,
    pub icon_url: Option<String>,
    pub humidity_display: String,
    pub wind_display: String,
    pub visibility_display: String,
    pub pressure_display: String,
    pub observed_at_display: String,
    pub sunrise_display: String,
    pub sunset_display: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One card of the daily forecast strip.
#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastDayCard {
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
    /// Abbreviated weekday, e.g. "Mon"
    pub day_label: String,
    pub temperature: Option<f64>,
    pub temperature_display: String,
    pub description: String,
    pub icon_url: Option<String>,
    /// Probability of precipitation, 0.0 to 1.0
    pub precipitation_probability: f64,
}

/// Point of the temperature chart. Missing temperatures are plotted at 0.
#[derive(Debug, Serialize, ToSchema)]
pub struct TemperaturePoint {
    pub date: String,
    pub day_label: String,
    pub value: f64,
    /// e.g. "Mon: 21.7°"
    pub tooltip: String,
}

/// Bar of the rain-probability chart.
#[derive(Debug, Serialize, ToSchema)]
pub struct RainBar {
    pub date: String,
    pub day_label: String,
    /// Whole percent, 0 to 100
    pub probability_percent: u8,
    /// e.g. "42%"
    pub display: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PollutantRow {
    /// Pollutant code, e.g. "pm2_5"
    pub code: String,
    /// e.g. "PM2_5: 0.5", or "PM2_5: -" when not reported
    pub display: String,
    pub value: Option<f64>,
}

/// Air-quality card.
#[derive(Debug, Serialize, ToSchema)]
pub struct AirQualityCard {
    /// AQI 1 (good) to 5 (very poor); null when unavailable
    pub index: Option<u8>,
    pub index_display: String,
    /// AQI label, or why there is no data
    pub label: String,
    /// Concentrations in µg/m³, keyed by pollutant code
    pub components: BTreeMap<String, f64>,
    /// The six tracked pollutants in display order
    pub pollutants: Vec<PollutantRow>,
}

/// Everything needed to render the dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub location: String,
    pub units: UnitSystem,
    /// When the snapshot was built (RFC 3339)
    pub generated_at: String,
    pub current: CurrentCard,
    /// At most five days, ascending
    pub forecast: Vec<ForecastDayCard>,
    pub temperature_chart: Vec<TemperaturePoint>,
    pub rain_chart: Vec<RainBar>,
    pub air_quality: AirQualityCard,
}

impl CurrentCard {
    fn new(c: &models::CurrentConditions) -> Self {
        let units = c.units;
        Self {
            city: c.city.clone(),
            country: c.country.clone(),
            temperature: c.temperature,
            temperature_display: format_temperature(c.temperature, units),
            feels_like_display: format_temperature(c.feels_like, units),
            temperature_min_display: format_temperature(c.temperature_min, units),
            temperature_max_display: format_temperature(c.temperature_max, units),
            description: c.description.clone(),
            icon_url: icon_url(c.icon_id.as_deref()),
            humidity_display: or_dash(c.humidity, "%"),
            wind_display: format_wind(c.wind_speed, units),
            visibility_display: or_dash(c.visibility, " m"),
            pressure_display: or_dash(c.pressure, " hPa"),
            observed_at_display: format_datetime(c.observed_at),
            sunrise_display: format_datetime(c.sunrise),
            sunset_display: format_datetime(c.sunset),
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

impl AirQualityCard {
    fn new(aq: &models::AirQualitySummary) -> Self {
        let pollutants = POLLUTANTS
            .iter()
            .map(|&code| {
                let value = aq.components.get(code).copied();
                PollutantRow {
                    code: code.to_string(),
                    display: format!(
                        "{}: {}",
                        code.to_uppercase(),
                        value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
                    ),
                    value,
                }
            })
            .collect();

        Self {
            index: aq.index,
            index_display: aq
                .index
                .map_or_else(|| MISSING.to_string(), |i| i.to_string()),
            label: aq.label.to_string(),
            components: aq.components.clone(),
            pollutants,
        }
    }
}

impl DashboardResponse {
    pub fn from_snapshot(s: &models::DashboardSnapshot) -> Self {
        let forecast = s
            .daily
            .iter()
            .map(|d| ForecastDayCard {
                date: d.date.to_string(),
                day_label: day_label(d.date),
                temperature: d.temperature,
                temperature_display: format_temperature(d.temperature, s.units),
                description: d.description.clone(),
                icon_url: icon_url(d.icon_id.as_deref()),
                precipitation_probability: d.precipitation_probability01,
            })
            .collect();

        let temperature_chart = s
            .temperature_series
            .iter()
            .map(|p| TemperaturePoint {
                date: p.date.to_string(),
                day_label: p.day_label.clone(),
                value: p.value,
                tooltip: format!("{}: {:.1}°", p.day_label, p.value),
            })
            .collect();

        let rain_chart = s
            .rain_series
            .iter()
            .map(|p| RainBar {
                date: p.date.to_string(),
                day_label: p.day_label.clone(),
                probability_percent: p.probability_percent,
                display: format!("{}%", p.probability_percent),
            })
            .collect();

        Self {
            location: s.location.clone(),
            units: s.units,
            generated_at: s.generated_at.to_rfc3339(),
            current: CurrentCard::new(&s.current),
            forecast,
            temperature_chart,
            rain_chart,
            air_quality: AirQualityCard::new(&s.air_quality),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Load the dashboard.
///
/// Covers search (`location`), refresh (no parameters) and unit change
/// (`units` only). Runs are serialized; concurrent requests queue. On failure
/// the previously loaded dashboard stays available at `/latest`.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Freshly assembled dashboard", body = DashboardResponse),
        (status = 400, description = "Blank location, unknown units or missing API key", body = ErrorResponse),
        (status = 502, description = "Weather provider failed or returned incomplete data", body = ErrorResponse),
    )
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let request = params.into_request()?;
    let snapshot = state.session.load(request).await?;
    Ok(Json(DashboardResponse::from_snapshot(&snapshot)))
}

/// The most recently loaded dashboard, without contacting the provider.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/latest",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Last successfully loaded dashboard", body = DashboardResponse),
        (status = 404, description = "Nothing loaded yet", body = ErrorResponse),
    )
)]
pub async fn get_latest_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let snapshot = state
        .session
        .latest()
        .await
        .ok_or_else(|| AppError::NotFound("No dashboard has been loaded yet".to_string()))?;
    Ok(Json(DashboardResponse::from_snapshot(&snapshot)))
}
