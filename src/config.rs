use crate::models::UnitSystem;

/// Placeholder shipped in deployment templates. Treated as "no key configured".
pub const UNCONFIGURED_API_KEY: &str = "YOUR_API_KEY_HERE";

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    /// OpenWeatherMap 2.5 base URL, without trailing slash.
    pub base_url: String,
    pub http_timeout_secs: u64,
    pub port: u16,
    /// Location shown before the user searches for anything.
    pub default_location: String,
    pub default_units: UnitSystem,
    pub default_language: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENWEATHER_API_KEY")
                .unwrap_or_else(|_| UNCONFIGURED_API_KEY.to_string()),
            base_url: std::env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5".to_string())
                .trim_end_matches('/')
                .to_string(),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            default_location: std::env::var("DEFAULT_LOCATION")
                .unwrap_or_else(|_| "Buenos Aires,AR".to_string()),
            default_units: std::env::var("DEFAULT_UNITS")
                .ok()
                .and_then(|v| UnitSystem::parse(&v))
                .unwrap_or_default(),
            default_language: std::env::var("DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| "es".to_string()),
        }
    }

    /// Whether a real credential is present (not empty, not the sentinel).
    pub fn has_api_key(&self) -> bool {
        is_configured_key(&self.api_key)
    }
}

pub fn is_configured_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != UNCONFIGURED_API_KEY
}
