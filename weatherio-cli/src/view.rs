//! Terminal implementations of the core view traits.

use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::sync::Notify;

use weatherio_core::{
    AirQuality, CurrentConditions, DashboardView, ForecastEntry, GeoLocation, SearchResult,
    SearchView, to_local_time,
};

/// Prints the search result list and signals when the search has settled,
/// so a one-shot command can wait for the debounced fetch to land.
pub struct TerminalSearchView {
    done: Notify,
}

impl Default for TerminalSearchView {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSearchView {
    pub fn new() -> Self {
        Self { done: Notify::new() }
    }

    /// Wait until results or an error have been rendered.
    pub async fn wait_done(&self, limit: Duration) -> Result<()> {
        tokio::time::timeout(limit, self.done.notified())
            .await
            .map_err(|_| anyhow!("Timed out waiting for search results"))
    }
}

impl SearchView for TerminalSearchView {
    fn set_searching(&self, searching: bool) {
        if searching {
            println!("Searching...");
        }
    }

    fn show_results(&self, results: &[SearchResult]) {
        if results.is_empty() {
            println!("No locations found.");
        } else {
            for result in results {
                println!("  {:40} {}", result.location.label(), result.route.fragment());
            }
        }
        self.done.notify_one();
    }

    fn clear_results(&self) {
        // One-shot command: there is no visible list to retract.
    }

    fn show_error(&self, message: &str) {
        eprintln!("Search failed: {message}");
        self.done.notify_one();
    }
}

/// Renders the dashboard sections as plain text blocks.
#[derive(Debug, Default)]
pub struct TerminalDashboard;

impl TerminalDashboard {
    pub fn new() -> Self {
        Self
    }
}

impl DashboardView for TerminalDashboard {
    fn set_loading(&self, loading: bool) {
        if loading {
            println!("Fetching weather...");
        }
    }

    fn clear_sections(&self) {
        // The terminal scrolls; nothing to clear.
    }

    fn set_current_location_enabled(&self, _enabled: bool) {
        // No geolocation in the terminal, so no control to toggle.
    }

    fn render_current(&self, place: Option<&GeoLocation>, current: &CurrentConditions) {
        let place = place
            .map(GeoLocation::label)
            .unwrap_or_else(|| "Unknown location".to_string());
        let observed = to_local_time(current.observed_at, current.utc_offset_secs);

        println!();
        println!("Now: {place}");
        println!("  {:.1} °C, {}", current.temperature_c, current.description);
        println!("  observed {}", observed.format("%a %d %b, %H:%M"));
    }

    fn render_highlights(&self, current: &CurrentConditions, air: &AirQuality) {
        let sunrise = to_local_time(current.sunrise, current.utc_offset_secs);
        let sunset = to_local_time(current.sunset, current.utc_offset_secs);

        println!();
        println!("Today's highlights");
        println!("  Air quality   {} ({})", air.aqi, aqi_label(air.aqi));
        println!(
            "                PM2.5 {:.1}   SO2 {:.1}   NO2 {:.1}   O3 {:.1}",
            air.pm2_5, air.so2, air.no2, air.o3
        );
        println!(
            "  Sunrise       {}        Sunset {}",
            sunrise.format("%H:%M"),
            sunset.format("%H:%M")
        );
        println!("  Humidity      {} %", current.humidity_pct);
        println!("  Pressure      {} hPa", current.pressure_hpa);
        match current.visibility_m {
            Some(meters) => println!("  Visibility    {:.1} km", f64::from(meters) / 1000.0),
            None => println!("  Visibility    n/a"),
        }
        println!("  Feels like    {:.1} °C", current.feels_like_c);
    }

    fn render_hourly(&self, entries: &[ForecastEntry], utc_offset_secs: i32) {
        println!();
        println!("Next 24 hours");
        for entry in entries {
            let at = to_local_time(entry.at, utc_offset_secs);
            println!(
                "  {}  {:>5.1} °C  {}",
                at.format("%H:%M"),
                entry.temperature_c,
                entry.description
            );
        }
    }

    fn render_daily(&self, entries: &[ForecastEntry], utc_offset_secs: i32) {
        println!();
        println!("5-day forecast");
        for entry in entries {
            let at = to_local_time(entry.at, utc_offset_secs);
            println!(
                "  {}  {:>5.1} °C  {}",
                at.format("%a %d %b"),
                entry.temperature_c,
                entry.description
            );
        }
    }

    fn show_error(&self, message: &str) {
        eprintln!("Could not load weather: {message}");
    }

    fn hide_error(&self) {
        // Nothing persistent to retract in a scrolling terminal.
    }
}

fn aqi_label(aqi: u8) -> &'static str {
    match aqi {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    }
}
