use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::dashboard::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok", or "degraded" when no API key is configured)
    pub status: String,
    /// API version
    pub version: String,
    /// Whether an OpenWeatherMap API key is configured
    pub api_key_configured: bool,
    /// Whether a dashboard has been loaded successfully since startup
    pub dashboard_loaded: bool,
}

/// Health check endpoint.
///
/// Never contacts the weather provider. Returns status "degraded" (still 200)
/// when the API key is missing, since every dashboard load would fail.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let dashboard_loaded = state.session.latest().await.is_some();

    Json(HealthResponse {
        status: if state.api_key_configured {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_key_configured: state.api_key_configured,
        dashboard_loaded,
    })
}
