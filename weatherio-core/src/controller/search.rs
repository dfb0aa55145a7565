use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::WeatherApi;
use crate::model::GeoLocation;
use crate::route::Route;

/// Where the search box currently is in its input/debounce/render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Debouncing,
    ShowingResults,
}

/// One selectable row of the search result list: the location plus the
/// route its item links to.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub location: GeoLocation,
    pub route: Route,
}

/// Rendering surface for the search box.
pub trait SearchView: Send + Sync {
    /// Toggle the indicator shown while a query is waiting to be sent.
    fn set_searching(&self, searching: bool);

    /// Replace the result list and make it visible.
    fn show_results(&self, results: &[SearchResult]);

    /// Hide the result list and drop its contents.
    fn clear_results(&self);

    /// Surface a failed search to the user.
    fn show_error(&self, message: &str);
}

/// Debounced search-as-you-type controller.
///
/// One instance owns the search box. Every keystroke is reported through
/// [`on_input`](Self::on_input), which restarts the quiet-period timer;
/// when the timer fires, the latest field value is sent to the geocoding
/// endpoint and the results are rendered through the [`SearchView`].
///
/// A keystroke cancels a pending timer but never an in-flight request, so
/// a slow response can still arrive after a newer one; the view shows
/// whichever response rendered last.
pub struct SearchController<A, V> {
    api: Arc<A>,
    view: Arc<V>,
    debounce: Duration,
    phase: Arc<Mutex<SearchPhase>>,
    pending: Option<JoinHandle<()>>,
}

impl<A, V> SearchController<A, V>
where
    A: WeatherApi + 'static,
    V: SearchView + 'static,
{
    pub fn new(api: Arc<A>, view: Arc<V>, debounce: Duration) -> Self {
        Self {
            api,
            view,
            debounce,
            phase: Arc::new(Mutex::new(SearchPhase::Idle)),
            pending: None,
        }
    }

    pub fn phase(&self) -> SearchPhase {
        *self.phase.lock()
    }

    /// Report the contents of the search field after a keystroke.
    ///
    /// Must be called from within a Tokio runtime; the debounce timer and
    /// the eventual fetch run as spawned tasks.
    pub fn on_input(&mut self, text: &str) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }

        if text.is_empty() {
            *self.phase.lock() = SearchPhase::Idle;
            self.view.clear_results();
            self.view.set_searching(false);
            return;
        }

        *self.phase.lock() = SearchPhase::Debouncing;
        self.view.set_searching(true);

        let api = Arc::clone(&self.api);
        let view = Arc::clone(&self.view);
        let phase = Arc::clone(&self.phase);
        let query = text.to_string();
        let debounce = self.debounce;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            // Detached: cancelling the timer must not cancel a request that
            // already left.
            tokio::spawn(async move {
                debug!(query = %query, "issuing location search");

                match api.search_locations(&query).await {
                    Ok(locations) => {
                        let results: Vec<SearchResult> = locations
                            .into_iter()
                            .map(|location| SearchResult {
                                route: Route::Weather(location.coord),
                                location,
                            })
                            .collect();

                        *phase.lock() = SearchPhase::ShowingResults;
                        view.set_searching(false);
                        view.show_results(&results);
                    }
                    Err(err) => {
                        *phase.lock() = SearchPhase::Idle;
                        view.set_searching(false);
                        view.show_error(&err.to_string());
                    }
                }
            });
        }));
    }
}

impl<A, V> Drop for SearchController<A, V> {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::client::ApiError;
    use crate::endpoint::Endpoint;
    use crate::model::{AirQuality, Coordinate, CurrentConditions, Forecast};

    const DEBOUNCE: Duration = Duration::from_millis(500);

    /// Geocoding stub: answers each query with a single location named
    /// after it, optionally after a per-query delay, and records every
    /// query it receives.
    #[derive(Debug, Default)]
    struct FakeGeocoder {
        queries: Mutex<Vec<String>>,
        delays: HashMap<String, Duration>,
        fail: bool,
    }

    impl FakeGeocoder {
        fn location_for(query: &str) -> GeoLocation {
            GeoLocation {
                name: query.to_string(),
                coord: Coordinate::new(51.5, -0.12),
                country: "GB".to_string(),
                state: None,
            }
        }
    }

    #[async_trait]
    impl WeatherApi for FakeGeocoder {
        async fn current_weather(&self, _: Coordinate) -> Result<CurrentConditions, ApiError> {
            unimplemented!("search tests never fetch weather")
        }

        async fn forecast(&self, _: Coordinate) -> Result<Forecast, ApiError> {
            unimplemented!("search tests never fetch forecasts")
        }

        async fn air_pollution(&self, _: Coordinate) -> Result<AirQuality, ApiError> {
            unimplemented!("search tests never fetch air quality")
        }

        async fn reverse_geocode(&self, _: Coordinate) -> Result<Vec<GeoLocation>, ApiError> {
            unimplemented!("search tests never reverse-geocode")
        }

        async fn search_locations(&self, query: &str) -> Result<Vec<GeoLocation>, ApiError> {
            self.queries.lock().push(query.to_string());

            if let Some(delay) = self.delays.get(query) {
                tokio::time::sleep(*delay).await;
            }

            if self.fail {
                return Err(ApiError::MissingData {
                    endpoint: Endpoint::GeoSearch,
                    what: "anything",
                });
            }

            Ok(vec![Self::location_for(query)])
        }
    }

    #[derive(Default)]
    struct RecordingView {
        searching: Mutex<bool>,
        results: Mutex<Option<Vec<SearchResult>>>,
        clears: Mutex<u32>,
        errors: Mutex<Vec<String>>,
    }

    impl SearchView for RecordingView {
        fn set_searching(&self, searching: bool) {
            *self.searching.lock() = searching;
        }

        fn show_results(&self, results: &[SearchResult]) {
            *self.results.lock() = Some(results.to_vec());
        }

        fn clear_results(&self) {
            *self.clears.lock() += 1;
            *self.results.lock() = None;
        }

        fn show_error(&self, message: &str) {
            self.errors.lock().push(message.to_string());
        }
    }

    fn controller(
        api: FakeGeocoder,
    ) -> (SearchController<FakeGeocoder, RecordingView>, Arc<FakeGeocoder>, Arc<RecordingView>)
    {
        let api = Arc::new(api);
        let view = Arc::new(RecordingView::default());
        let controller = SearchController::new(Arc::clone(&api), Arc::clone(&view), DEBOUNCE);
        (controller, api, view)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_keystrokes_issue_one_request_with_the_final_query() {
        let (mut search, api, view) = controller(FakeGeocoder::default());

        search.on_input("L");
        search.on_input("Lo");
        search.on_input("Lon");
        search.on_input("London");
        assert_eq!(search.phase(), SearchPhase::Debouncing);
        assert!(*view.searching.lock());

        tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;

        assert_eq!(*api.queries.lock(), vec!["London".to_string()]);
        assert_eq!(search.phase(), SearchPhase::ShowingResults);
        assert!(!*view.searching.lock());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_keystrokes_issue_one_request_each() {
        let (mut search, api, _view) = controller(FakeGeocoder::default());

        search.on_input("Lo");
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(10)).await;

        search.on_input("Lon");
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(10)).await;

        assert_eq!(*api.queries.lock(), vec!["Lo".to_string(), "Lon".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_the_field_hides_results_and_cancels_the_pending_timer() {
        let (mut search, api, view) = controller(FakeGeocoder::default());

        search.on_input("Lond");
        tokio::time::sleep(Duration::from_millis(100)).await;

        search.on_input("");
        assert_eq!(search.phase(), SearchPhase::Idle);
        assert_eq!(*view.clears.lock(), 1);
        assert!(!*view.searching.lock());

        // The cancelled timer never fires, so no request goes out.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(api.queries.lock().is_empty());
        assert!(view.results.lock().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn results_carry_one_route_per_location() {
        #[derive(Debug, Default)]
        struct TwoHits(Mutex<Vec<String>>);

        #[async_trait]
        impl WeatherApi for TwoHits {
            async fn current_weather(&self, _: Coordinate) -> Result<CurrentConditions, ApiError> {
                unimplemented!()
            }

            async fn forecast(&self, _: Coordinate) -> Result<Forecast, ApiError> {
                unimplemented!()
            }

            async fn air_pollution(&self, _: Coordinate) -> Result<AirQuality, ApiError> {
                unimplemented!()
            }

            async fn reverse_geocode(&self, _: Coordinate) -> Result<Vec<GeoLocation>, ApiError> {
                unimplemented!()
            }

            async fn search_locations(&self, query: &str) -> Result<Vec<GeoLocation>, ApiError> {
                self.0.lock().push(query.to_string());
                Ok(vec![
                    GeoLocation {
                        name: "London".to_string(),
                        coord: Coordinate::new(51.5, -0.12),
                        country: "GB".to_string(),
                        state: None,
                    },
                    GeoLocation {
                        name: "London".to_string(),
                        coord: Coordinate::new(39.88, -83.45),
                        country: "US".to_string(),
                        state: Some("Ohio".to_string()),
                    },
                ])
            }
        }

        let api = Arc::new(TwoHits::default());
        let view = Arc::new(RecordingView::default());
        let mut search = SearchController::new(Arc::clone(&api), Arc::clone(&view), DEBOUNCE);

        search.on_input("London");
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;

        let results = view.results.lock().clone().expect("results rendered");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].route, Route::Weather(Coordinate::new(51.5, -0.12)));
        assert_eq!(results[1].route, Route::Weather(Coordinate::new(39.88, -83.45)));
        assert_eq!(results[1].location.state.as_deref(), Some("Ohio"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_search_surfaces_an_error_instead_of_spinning() {
        let (mut search, _api, view) = controller(FakeGeocoder { fail: true, ..Default::default() });

        search.on_input("London");
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;

        assert!(!*view.searching.lock());
        assert_eq!(view.errors.lock().len(), 1);
        assert_eq!(search.phase(), SearchPhase::Idle);
    }

    /// In-flight requests are never cancelled and responses are applied in
    /// completion order, so a slow stale response overwrites newer results.
    /// This pins the known reordering gap rather than endorsing it.
    #[tokio::test(start_paused = true)]
    async fn stale_response_can_overwrite_newer_results() {
        let mut delays = HashMap::new();
        delays.insert("slow".to_string(), Duration::from_millis(1000));
        let (mut search, api, view) = controller(FakeGeocoder { delays, ..Default::default() });

        search.on_input("slow");
        // Let the timer fire so the slow request is in flight.
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(50)).await;
        assert_eq!(*api.queries.lock(), vec!["slow".to_string()]);

        search.on_input("fast");
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;

        let rendered = view.results.lock().clone().expect("fast results rendered");
        assert_eq!(rendered[0].location.name, "fast");

        // The stale request completes afterwards and clobbers the view.
        tokio::time::sleep(Duration::from_millis(500)).await;
        let rendered = view.results.lock().clone().expect("results still shown");
        assert_eq!(rendered[0].location.name, "slow");
    }
}
