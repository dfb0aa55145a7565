use reqwest::Url;

use crate::model::Coordinate;

/// One of the five fixed remote operations of the OpenWeatherMap API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    CurrentWeather,
    Forecast,
    AirPollution,
    ReverseGeo,
    GeoSearch,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::CurrentWeather => "current-weather",
            Endpoint::Forecast => "forecast",
            Endpoint::AirPollution => "air-pollution",
            Endpoint::ReverseGeo => "reverse-geocode",
            Endpoint::GeoSearch => "geo-search",
        }
    }

    pub const fn path(&self) -> &'static str {
        match self {
            Endpoint::CurrentWeather => "/data/2.5/weather",
            Endpoint::Forecast => "/data/2.5/forecast",
            Endpoint::AirPollution => "/data/2.5/air_pollution",
            Endpoint::ReverseGeo => "/geo/1.0/reverse",
            Endpoint::GeoSearch => "/geo/1.0/direct",
        }
    }

    pub const fn all() -> &'static [Endpoint] {
        &[
            Endpoint::CurrentWeather,
            Endpoint::Forecast,
            Endpoint::AirPollution,
            Endpoint::ReverseGeo,
            Endpoint::GeoSearch,
        ]
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds fully qualified request URLs for every [`Endpoint`].
///
/// Carries the fixed query parameters (credential, units, geocoding result
/// limit) so callers only supply what varies per request. Building a URL is
/// pure and never fails; whether the coordinate or query makes sense is the
/// caller's business.
#[derive(Debug, Clone)]
pub struct ApiUrls {
    base: Url,
    api_key: String,
    units: String,
    limit: u8,
}

impl ApiUrls {
    pub fn new(base: Url, api_key: impl Into<String>, units: impl Into<String>, limit: u8) -> Self {
        Self { base, api_key: api_key.into(), units: units.into(), limit }
    }

    pub fn current_weather(&self, coord: Coordinate) -> Url {
        let mut url = self.coord_url(Endpoint::CurrentWeather, coord);
        url.query_pairs_mut()
            .append_pair("units", &self.units)
            .append_pair("appid", &self.api_key);
        url
    }

    pub fn forecast(&self, coord: Coordinate) -> Url {
        let mut url = self.coord_url(Endpoint::Forecast, coord);
        url.query_pairs_mut()
            .append_pair("units", &self.units)
            .append_pair("appid", &self.api_key);
        url
    }

    /// Air pollution is reported on a fixed scale, so no `units` parameter.
    pub fn air_pollution(&self, coord: Coordinate) -> Url {
        let mut url = self.coord_url(Endpoint::AirPollution, coord);
        url.query_pairs_mut().append_pair("appid", &self.api_key);
        url
    }

    pub fn reverse_geo(&self, coord: Coordinate) -> Url {
        let mut url = self.coord_url(Endpoint::ReverseGeo, coord);
        url.query_pairs_mut()
            .append_pair("limit", &self.limit.to_string())
            .append_pair("appid", &self.api_key);
        url
    }

    pub fn geo_search(&self, query: &str) -> Url {
        let mut url = self.url_for(Endpoint::GeoSearch);
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &self.limit.to_string())
            .append_pair("appid", &self.api_key);
        url
    }

    fn url_for(&self, endpoint: Endpoint) -> Url {
        let mut url = self.base.clone();
        url.set_path(endpoint.path());
        url
    }

    fn coord_url(&self, endpoint: Endpoint, coord: Coordinate) -> Url {
        let mut url = self.url_for(endpoint);
        url.query_pairs_mut()
            .append_pair("lat", &coord.lat.to_string())
            .append_pair("lon", &coord.lon.to_string());
        url
    }
}
