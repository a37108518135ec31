// Weather Dashboard API v0.1
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod models;
mod routes;
mod services;

use config::AppConfig;
use routes::dashboard::AppState;
use services::dashboard::{DashboardRequest, DashboardSelection, DashboardSession};
use services::openweather::OpenWeatherClient;

/// Weather Dashboard API OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Dashboard API",
        version = "0.1.0",
        description = "Weather dashboard backend. Fetches current conditions, the \
            5-day / 3-hour forecast and air pollution data from OpenWeatherMap, \
            reduces the forecast to one representative entry per day and serves \
            ready-to-render cards and chart series.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Dashboard", description = "Dashboard loading and retrieval"),
    ),
    paths(
        routes::health::health_check,
        routes::dashboard::get_dashboard,
        routes::dashboard::get_latest_dashboard,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::dashboard::DashboardResponse,
            routes::dashboard::CurrentCard,
            routes::dashboard::ForecastDayCard,
            routes::dashboard::TemperaturePoint,
            routes::dashboard::RainBar,
            routes::dashboard::AirQualityCard,
            routes::dashboard::PollutantRow,
            models::UnitSystem,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_dashboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    if !config.has_api_key() {
        tracing::warn!(
            "OPENWEATHER_API_KEY is not set; dashboard requests will be rejected until it is"
        );
    }

    let client = OpenWeatherClient::new(&config).expect("Failed to build HTTP client");
    let session = Arc::new(DashboardSession::new(
        Arc::new(client),
        DashboardSelection {
            location: config.default_location.clone(),
            units: config.default_units,
            language: config.default_language.clone(),
        },
    ));

    // Load the default location in the background so /latest has something to show
    if config.has_api_key() {
        let session = session.clone();
        tokio::spawn(async move {
            match session.load(DashboardRequest::default()).await {
                Ok(snapshot) => tracing::info!("Initial dashboard loaded for '{}'", snapshot.location),
                Err(e) => tracing::warn!("Initial dashboard load failed: {}", e),
            }
        });
    }

    let app_state = AppState {
        session,
        api_key_configured: config.has_api_key(),
    };

    // CORS: read-only API, restrict methods to GET
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/dashboard", get(routes::dashboard::get_dashboard))
        .route(
            "/api/v1/dashboard/latest",
            get(routes::dashboard::get_latest_dashboard),
        )
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
