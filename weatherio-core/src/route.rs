use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::Coordinate;

/// A navigation target, encoded as a URL fragment the way the dashboard
/// links between views: `#/current-location` or `#/weather?lat=..&lon=..`.
///
/// Every search result links to a `Weather` route carrying its
/// coordinates; the dashboard reads the active route to decide whether the
/// "use current location" control is applicable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Route {
    CurrentLocation,
    Weather(Coordinate),
}

#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("unrecognized route fragment: {0}")]
    Unrecognized(String),

    #[error("weather route is missing the `{0}` parameter")]
    MissingParam(&'static str),

    #[error("weather route has a malformed `{name}` value: {value}")]
    MalformedParam { name: &'static str, value: String },
}

impl Route {
    pub fn fragment(&self) -> String {
        match self {
            Route::CurrentLocation => "#/current-location".to_string(),
            Route::Weather(coord) => format!("#/weather?lat={}&lon={}", coord.lat, coord.lon),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fragment())
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix('#').unwrap_or(s);

        if trimmed == "/current-location" {
            return Ok(Route::CurrentLocation);
        }

        let Some(query) = trimmed.strip_prefix("/weather?") else {
            return Err(RouteError::Unrecognized(s.to_string()));
        };

        let mut lat = None;
        let mut lon = None;

        for pair in query.split('&') {
            let Some((name, value)) = pair.split_once('=') else {
                return Err(RouteError::Unrecognized(s.to_string()));
            };

            match name {
                "lat" => lat = Some(parse_param("lat", value)?),
                "lon" => lon = Some(parse_param("lon", value)?),
                // Unknown parameters are ignored.
                _ => {}
            }
        }

        let lat = lat.ok_or(RouteError::MissingParam("lat"))?;
        let lon = lon.ok_or(RouteError::MissingParam("lon"))?;

        Ok(Route::Weather(Coordinate::new(lat, lon)))
    }
}

fn parse_param(name: &'static str, value: &str) -> Result<f64, RouteError> {
    value
        .parse()
        .map_err(|_| RouteError::MalformedParam { name, value: value.to_string() })
}
