use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair identifying a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One result of a forward or reverse geocoding lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation {
    pub name: String,
    pub coord: Coordinate,
    pub country: String,
    pub state: Option<String>,
}

impl GeoLocation {
    /// Human-readable "Name, State, Country"; the state segment is omitted
    /// when the provider did not report one.
    pub fn label(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

/// Current conditions at a location, as shown by the dashboard.
#[derive(Debug, Clone)]
pub struct CurrentConditions {
    pub description: String,
    pub icon: String,
    pub observed_at: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub pressure_hpa: u32,
    pub humidity_pct: u8,
    /// Meters; the provider omits it in some conditions.
    pub visibility_m: Option<u32>,
    pub utc_offset_secs: i32,
}

/// One 3-hourly slot of the 5-day forecast.
#[derive(Debug, Clone)]
pub struct ForecastEntry {
    pub at: DateTime<Utc>,
    pub temperature_c: f64,
    pub description: String,
    pub icon: String,
}

/// Five days of 3-hourly forecast entries for one location.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub city: String,
    pub country: String,
    pub utc_offset_secs: i32,
    pub entries: Vec<ForecastEntry>,
}

impl Forecast {
    /// The next 24 hours: the first eight 3-hourly entries.
    pub fn hourly(&self) -> &[ForecastEntry] {
        let len = self.entries.len().min(8);
        &self.entries[..len]
    }

    /// One representative entry per forecast day: every eighth slot,
    /// starting from the eighth.
    pub fn daily_outlook(&self) -> Vec<ForecastEntry> {
        self.entries.iter().skip(7).step_by(8).cloned().collect()
    }
}

/// Air-quality snapshot; `aqi` is the provider's 1 (good) to 5 (very poor)
/// index.
#[derive(Debug, Clone)]
pub struct AirQuality {
    pub aqi: u8,
    pub pm2_5: f64,
    pub so2: f64,
    pub no2: f64,
    pub o3: f64,
    pub measured_at: DateTime<Utc>,
}

/// Shift a UTC timestamp into a location's local time given its UTC offset
/// in seconds. Falls back to UTC if the offset is out of range.
pub fn to_local_time(at: DateTime<Utc>, utc_offset_secs: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| Utc.fix());
    at.with_timezone(&offset)
}
