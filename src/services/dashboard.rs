//! Dashboard assembly.
//!
//! One run: validate, fetch current conditions and forecast concurrently,
//! look up air quality at the current location's coordinates, aggregate the
//! forecast per day and build the chart series. The result is an immutable
//! `DashboardSnapshot`.
//!
//! `DashboardSession` keeps the dashboard's selection (location, units,
//! language) and the last snapshot that rendered successfully. Runs are
//! serialized: a trigger arriving while a run is in flight waits for it.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::errors::AppError;
use crate::models::{DashboardSnapshot, UnitSystem};
use crate::services::aggregator::aggregate_daily;
use crate::services::air_quality::resolve_air_quality;
use crate::services::openweather::{require_location, WeatherProvider};
use crate::services::series::{build_rain_series, build_temperature_series};

/// Number of forecast days shown (cards and chart points).
pub const MAX_FORECAST_DAYS: usize = 5;

/// Build a dashboard snapshot for one location.
pub async fn assemble_dashboard(
    provider: &dyn WeatherProvider,
    location: &str,
    units: UnitSystem,
    language: &str,
) -> Result<DashboardSnapshot, AppError> {
    let location = require_location(location)?;

    // Air quality only needs coordinates, so the forecast can load in parallel
    // with current conditions.
    let (current, samples) = futures::future::try_join(
        provider.fetch_current(location, units, language),
        provider.fetch_forecast(location, units, language),
    )
    .await?;

    let air_quality = resolve_air_quality(provider, current.latitude, current.longitude).await;

    let mut daily = aggregate_daily(&samples);
    daily.truncate(MAX_FORECAST_DAYS);
    let temperature_series = build_temperature_series(&daily);
    let rain_series = build_rain_series(&daily);

    tracing::info!(
        "Dashboard for '{}' assembled: {} samples -> {} days, AQI {}",
        location,
        samples.len(),
        daily.len(),
        air_quality.label
    );

    Ok(DashboardSnapshot {
        location: location.to_string(),
        units,
        current,
        daily,
        temperature_series,
        rain_series,
        air_quality,
        generated_at: Utc::now(),
    })
}

/// What the dashboard is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSelection {
    pub location: String,
    pub units: UnitSystem,
    pub language: String,
}

/// A user trigger. `None` fields keep the current selection, so an empty
/// request is a refresh and a request with only `units` is a unit change.
#[derive(Debug, Clone, Default)]
pub struct DashboardRequest {
    pub location: Option<String>,
    pub units: Option<UnitSystem>,
    pub language: Option<String>,
}

/// Dashboard state shared by the HTTP handlers.
pub struct DashboardSession {
    provider: Arc<dyn WeatherProvider>,
    /// Held for the whole run; this is what serializes triggers.
    selection: Mutex<DashboardSelection>,
    latest: RwLock<Option<Arc<DashboardSnapshot>>>,
}

impl DashboardSession {
    pub fn new(provider: Arc<dyn WeatherProvider>, initial: DashboardSelection) -> Self {
        Self {
            provider,
            selection: Mutex::new(initial),
            latest: RwLock::new(None),
        }
    }

    /// Run the pipeline for `request` and publish the snapshot.
    ///
    /// The selection only changes when the run succeeds; on failure the
    /// previous snapshot stays in place.
    pub async fn load(&self, request: DashboardRequest) -> Result<Arc<DashboardSnapshot>, AppError> {
        let mut selection = self.selection.lock().await;

        let mut next = selection.clone();
        if let Some(location) = request.location {
            next.location = require_location(&location)?.to_string();
        }
        if let Some(units) = request.units {
            next.units = units;
        }
        if let Some(language) = request.language.filter(|l| !l.trim().is_empty()) {
            next.language = language.trim().to_string();
        }

        let result =
            assemble_dashboard(self.provider.as_ref(), &next.location, next.units, &next.language)
                .await;

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.latest.write().await = Some(Arc::clone(&snapshot));
                *selection = next;
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!("Dashboard load for '{}' failed: {}", next.location, e);
                Err(e)
            }
        }
    }

    /// Last successfully rendered snapshot, if any. Never waits for a run.
    pub async fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.latest.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::air_quality::LABEL_NO_DATA;
    use crate::services::testing::{slot, two_day_fixture, FakeProvider};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn selection() -> DashboardSelection {
        DashboardSelection {
            location: "Buenos Aires,AR".to_string(),
            units: UnitSystem::Metric,
            language: "es".to_string(),
        }
    }

    #[tokio::test]
    async fn test_assemble_two_day_fixture() {
        let provider = FakeProvider::new(two_day_fixture());
        let snapshot = assemble_dashboard(&provider, "Buenos Aires,AR", UnitSystem::Metric, "es")
            .await
            .unwrap();

        let temps: Vec<Option<f64>> = snapshot.daily.iter().map(|d| d.temperature).collect();
        assert_eq!(temps, vec![Some(15.0), Some(18.0)]);
        assert_eq!(snapshot.daily[0].description, "Few clouds");

        let series: Vec<f64> = snapshot.temperature_series.iter().map(|p| p.value).collect();
        assert_eq!(series, vec![15.0, 18.0]);
        let rain: Vec<u8> = snapshot
            .rain_series
            .iter()
            .map(|p| p.probability_percent)
            .collect();
        assert_eq!(rain, vec![20, 20]);

        assert_eq!(snapshot.air_quality.index, Some(2));
        assert_eq!(snapshot.air_quality.label, "Fair");
        assert_eq!(snapshot.location, "Buenos Aires,AR");
        assert_eq!(snapshot.current.city, "Buenos Aires,AR");

        assert_eq!(provider.current_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.forecast_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.air_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_eight_slot_day_without_noon_uses_index_four() {
        let samples: Vec<_> = [0, 3, 6, 9, 13, 15, 18, 21]
            .iter()
            .map(|&h| slot(20, h, f64::from(h)))
            .collect();
        let provider = FakeProvider::new(samples);
        let snapshot = assemble_dashboard(&provider, "Lima", UnitSystem::Metric, "es")
            .await
            .unwrap();
        assert_eq!(snapshot.daily[0].temperature, Some(13.0));
    }

    #[tokio::test]
    async fn test_blank_location_makes_no_calls() {
        let provider = FakeProvider::new(two_day_fixture());
        let err = assemble_dashboard(&provider, "  ", UnitSystem::Metric, "es")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let provider = FakeProvider::new(two_day_fixture());
        let err = assemble_dashboard(&provider, "Atlantis", UnitSystem::Metric, "es")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Weather API error: city not found");
        assert_eq!(provider.air_calls.load(Ordering::SeqCst), 0);

        let mut provider = FakeProvider::new(two_day_fixture());
        provider.fail_forecast = true;
        let err = assemble_dashboard(&provider, "Lima", UnitSystem::Metric, "es")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_no_coordinates_skips_air_quality() {
        let mut provider = FakeProvider::new(two_day_fixture());
        provider.coordinates = None;
        let snapshot = assemble_dashboard(&provider, "Lima", UnitSystem::Metric, "es")
            .await
            .unwrap();

        assert_eq!(provider.air_calls.load(Ordering::SeqCst), 0);
        assert_eq!(snapshot.air_quality.index, None);
        assert_eq!(snapshot.air_quality.label, LABEL_NO_DATA);
        assert!(snapshot.air_quality.components.is_empty());
    }

    #[tokio::test]
    async fn test_caps_at_five_days() {
        let samples: Vec<_> = (17..23).map(|d| slot(d, 12, f64::from(d))).collect();
        let provider = FakeProvider::new(samples);
        let snapshot = assemble_dashboard(&provider, "Lima", UnitSystem::Metric, "es")
            .await
            .unwrap();

        assert_eq!(snapshot.daily.len(), MAX_FORECAST_DAYS);
        assert_eq!(snapshot.temperature_series.len(), MAX_FORECAST_DAYS);
        assert_eq!(snapshot.rain_series.len(), MAX_FORECAST_DAYS);
        assert_eq!(snapshot.daily[4].temperature, Some(21.0));
    }

    #[tokio::test]
    async fn test_empty_forecast_renders_empty_lists() {
        let provider = FakeProvider::new(vec![]);
        let snapshot = assemble_dashboard(&provider, "Lima", UnitSystem::Metric, "es")
            .await
            .unwrap();
        assert!(snapshot.daily.is_empty());
        assert!(snapshot.temperature_series.is_empty());
        assert!(snapshot.rain_series.is_empty());
    }

    #[tokio::test]
    async fn test_session_refresh_and_unit_change_reuse_location() {
        let session = DashboardSession::new(Arc::new(FakeProvider::new(two_day_fixture())), selection());
        assert!(session.latest().await.is_none());

        let first = session.load(DashboardRequest::default()).await.unwrap();
        assert_eq!(first.location, "Buenos Aires,AR");
        assert_eq!(first.units, UnitSystem::Metric);

        let searched = session
            .load(DashboardRequest {
                location: Some(" London,UK ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.location, "London,UK");

        let imperial = session
            .load(DashboardRequest {
                units: Some(UnitSystem::Imperial),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(imperial.location, "London,UK");
        assert_eq!(imperial.units, UnitSystem::Imperial);
        assert_eq!(imperial.current.units, UnitSystem::Imperial);

        let latest = session.latest().await.unwrap();
        assert!(Arc::ptr_eq(&latest, &imperial));
    }

    #[tokio::test]
    async fn test_session_failure_keeps_previous_snapshot() {
        let session = DashboardSession::new(Arc::new(FakeProvider::new(two_day_fixture())), selection());
        let good = session.load(DashboardRequest::default()).await.unwrap();

        let err = session
            .load(DashboardRequest {
                location: Some("Atlantis".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(Arc::ptr_eq(&session.latest().await.unwrap(), &good));

        // The failed search did not replace the selected location.
        let refreshed = session.load(DashboardRequest::default()).await.unwrap();
        assert_eq!(refreshed.location, "Buenos Aires,AR");
    }

    #[tokio::test]
    async fn test_session_blank_search_is_rejected() {
        let provider = Arc::new(FakeProvider::new(two_day_fixture()));
        let session = DashboardSession::new(provider.clone(), selection());
        let err = session
            .load(DashboardRequest {
                location: Some("".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_session_serializes_runs() {
        let mut provider = FakeProvider::new(two_day_fixture());
        provider.delay = Some(Duration::from_millis(30));
        let provider = Arc::new(provider);
        let session = DashboardSession::new(provider.clone(), selection());

        let (a, b) = tokio::join!(
            session.load(DashboardRequest::default()),
            session.load(DashboardRequest {
                location: Some("Lima".to_string()),
                ..Default::default()
            }),
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(provider.current_calls.load(Ordering::SeqCst), 2);
        assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 1);
    }
}
