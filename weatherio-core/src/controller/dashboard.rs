use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{instrument, warn};

use crate::client::{ApiError, WeatherApi};
use crate::model::{AirQuality, Coordinate, CurrentConditions, ForecastEntry, GeoLocation};
use crate::route::Route;

/// Rendering surface for the weather dashboard, one method per display
/// hook: loading indicator, error panel, the current-location control, and
/// the four content sections.
pub trait DashboardView: Send + Sync {
    fn set_loading(&self, loading: bool);

    /// Empty all four content sections ahead of a refresh.
    fn clear_sections(&self);

    fn set_current_location_enabled(&self, enabled: bool);

    /// `place` is the closest reverse-geocoding hit, when there is one.
    fn render_current(&self, place: Option<&GeoLocation>, current: &CurrentConditions);

    fn render_highlights(&self, current: &CurrentConditions, air: &AirQuality);

    /// `utc_offset_secs` is the forecast location's UTC offset, for
    /// rendering slot times in local time.
    fn render_hourly(&self, entries: &[ForecastEntry], utc_offset_secs: i32);

    fn render_daily(&self, entries: &[ForecastEntry], utc_offset_secs: i32);

    fn show_error(&self, message: &str);

    fn hide_error(&self);
}

/// Orchestrates one full dashboard refresh for a location.
pub struct DashboardController<A, V> {
    api: Arc<A>,
    view: Arc<V>,
    load_timeout: Duration,
}

impl<A, V> DashboardController<A, V>
where
    A: WeatherApi,
    V: DashboardView,
{
    pub fn new(api: Arc<A>, view: Arc<V>, load_timeout: Duration) -> Self {
        Self { api, view, load_timeout }
    }

    /// Refresh every dashboard section for `coord`.
    ///
    /// The whole fetch sequence runs under one deadline. On expiry or on
    /// the first failed fetch, the loading indicator comes down and the
    /// error panel goes up; the spinner is never left in place.
    #[instrument(skip(self), fields(lat = %coord.lat, lon = %coord.lon))]
    pub async fn update_weather(&self, coord: Coordinate, route: Route) {
        self.view.set_loading(true);
        self.view.clear_sections();
        self.view.hide_error();

        // Already looking at the current location: nothing for the control
        // to navigate to.
        self.view
            .set_current_location_enabled(!matches!(route, Route::CurrentLocation));

        let outcome = timeout(self.load_timeout, self.refresh(coord)).await;

        self.view.set_loading(false);

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(%err, "dashboard refresh failed");
                self.view.show_error(&err.to_string());
            }
            Err(_) => {
                warn!(timeout = ?self.load_timeout, "dashboard refresh timed out");
                self.view.show_error("The weather service did not respond in time.");
            }
        }
    }

    async fn refresh(&self, coord: Coordinate) -> Result<(), ApiError> {
        let current = self.api.current_weather(coord).await?;
        let places = self.api.reverse_geocode(coord).await?;
        self.view.render_current(places.first(), &current);

        let air = self.api.air_pollution(coord).await?;
        self.view.render_highlights(&current, &air);

        let forecast = self.api.forecast(coord).await?;
        self.view.render_hourly(forecast.hourly(), forecast.utc_offset_secs);
        self.view.render_daily(&forecast.daily_outlook(), forecast.utc_offset_secs);

        Ok(())
    }
}
