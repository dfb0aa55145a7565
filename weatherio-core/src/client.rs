use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::endpoint::{ApiUrls, Endpoint};
use crate::model::{AirQuality, Coordinate, CurrentConditions, Forecast, ForecastEntry, GeoLocation};

/// Everything that can go wrong in one fetch-and-decode round trip.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{endpoint} request failed: {source}")]
    Request {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} response contained no {what}")]
    MissingData {
        endpoint: Endpoint,
        what: &'static str,
    },
}

/// Remote operations the dashboard depends on.
///
/// [`OpenWeatherClient`] is the production implementation; the controllers
/// only see this trait, so tests can substitute their own.
#[async_trait]
pub trait WeatherApi: Send + Sync + std::fmt::Debug {
    async fn current_weather(&self, coord: Coordinate) -> Result<CurrentConditions, ApiError>;

    async fn forecast(&self, coord: Coordinate) -> Result<Forecast, ApiError>;

    async fn air_pollution(&self, coord: Coordinate) -> Result<AirQuality, ApiError>;

    async fn reverse_geocode(&self, coord: Coordinate) -> Result<Vec<GeoLocation>, ApiError>;

    async fn search_locations(&self, query: &str) -> Result<Vec<GeoLocation>, ApiError>;
}

/// HTTP client for the OpenWeatherMap weather and geocoding endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    urls: ApiUrls,
}

impl OpenWeatherClient {
    /// Build a client whose individual requests are bounded by
    /// `request_timeout`, so a dead network surfaces as an error instead of
    /// a hang.
    pub fn new(urls: ApiUrls, request_timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self { http, urls })
    }

    async fn fetch<T: DeserializeOwned>(&self, endpoint: Endpoint, url: Url) -> Result<T, ApiError> {
        debug!(%endpoint, url = %url, "fetching");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::Request { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ApiError::Request { endpoint, source })?;

        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status, body: truncate_body(&body) });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { endpoint, source })
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current_weather(&self, coord: Coordinate) -> Result<CurrentConditions, ApiError> {
        let url = self.urls.current_weather(coord);
        let parsed: OwCurrentResponse = self.fetch(Endpoint::CurrentWeather, url).await?;
        map_current(parsed)
    }

    async fn forecast(&self, coord: Coordinate) -> Result<Forecast, ApiError> {
        let url = self.urls.forecast(coord);
        let parsed: OwForecastResponse = self.fetch(Endpoint::Forecast, url).await?;
        Ok(map_forecast(parsed))
    }

    async fn air_pollution(&self, coord: Coordinate) -> Result<AirQuality, ApiError> {
        let url = self.urls.air_pollution(coord);
        let parsed: OwAirResponse = self.fetch(Endpoint::AirPollution, url).await?;
        map_air(parsed)
    }

    async fn reverse_geocode(&self, coord: Coordinate) -> Result<Vec<GeoLocation>, ApiError> {
        let url = self.urls.reverse_geo(coord);
        let parsed: Vec<OwGeoEntry> = self.fetch(Endpoint::ReverseGeo, url).await?;
        Ok(map_geo(parsed))
    }

    async fn search_locations(&self, query: &str) -> Result<Vec<GeoLocation>, ApiError> {
        let url = self.urls.geo_search(query);
        let parsed: Vec<OwGeoEntry> = self.fetch(Endpoint::GeoSearch, url).await?;
        Ok(map_geo(parsed))
    }
}

#[derive(Debug, Deserialize)]
struct OwDescriptor {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    pressure: u32,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    weather: Vec<OwDescriptor>,
    dt: i64,
    sys: OwSys,
    main: OwMain,
    visibility: Option<u32>,
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    country: String,
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwDescriptor>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwAqiMain {
    aqi: u8,
}

#[derive(Debug, Deserialize)]
struct OwComponents {
    pm2_5: f64,
    so2: f64,
    no2: f64,
    o3: f64,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    dt: i64,
    main: OwAqiMain,
    components: OwComponents,
}

#[derive(Debug, Deserialize)]
struct OwAirResponse {
    list: Vec<OwAirEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    country: String,
    #[serde(default)]
    state: Option<String>,
}

fn map_current(parsed: OwCurrentResponse) -> Result<CurrentConditions, ApiError> {
    let descriptor = parsed.weather.into_iter().next().ok_or(ApiError::MissingData {
        endpoint: Endpoint::CurrentWeather,
        what: "weather descriptor",
    })?;

    Ok(CurrentConditions {
        description: descriptor.description,
        icon: descriptor.icon,
        observed_at: unix_to_utc(parsed.dt).unwrap_or_else(Utc::now),
        sunrise: unix_to_utc(parsed.sys.sunrise).unwrap_or_else(Utc::now),
        sunset: unix_to_utc(parsed.sys.sunset).unwrap_or_else(Utc::now),
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        pressure_hpa: parsed.main.pressure,
        humidity_pct: parsed.main.humidity,
        visibility_m: parsed.visibility,
        utc_offset_secs: parsed.timezone,
    })
}

fn map_forecast(parsed: OwForecastResponse) -> Forecast {
    let entries = parsed
        .list
        .into_iter()
        .map(|entry| {
            let descriptor = entry.weather.into_iter().next();
            let (description, icon) = match descriptor {
                Some(d) => (d.description, d.icon),
                None => ("unknown".to_string(), String::new()),
            };

            ForecastEntry {
                at: unix_to_utc(entry.dt).unwrap_or_else(Utc::now),
                temperature_c: entry.main.temp,
                description,
                icon,
            }
        })
        .collect();

    Forecast {
        city: parsed.city.name,
        country: parsed.city.country,
        utc_offset_secs: parsed.city.timezone,
        entries,
    }
}

fn map_air(parsed: OwAirResponse) -> Result<AirQuality, ApiError> {
    let entry = parsed.list.into_iter().next().ok_or(ApiError::MissingData {
        endpoint: Endpoint::AirPollution,
        what: "measurements",
    })?;

    Ok(AirQuality {
        aqi: entry.main.aqi,
        pm2_5: entry.components.pm2_5,
        so2: entry.components.so2,
        no2: entry.components.no2,
        o3: entry.components.o3,
        measured_at: unix_to_utc(entry.dt).unwrap_or_else(Utc::now),
    })
}

fn map_geo(entries: Vec<OwGeoEntry>) -> Vec<GeoLocation> {
    entries
        .into_iter()
        .map(|entry| GeoLocation {
            name: entry.name,
            coord: Coordinate::new(entry.lat, entry.lon),
            country: entry.country,
            state: entry.state,
        })
        .collect()
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}
