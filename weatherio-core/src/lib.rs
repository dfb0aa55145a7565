//! Core library for the `weatherio` dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeatherMap API client: URL building, fetch, decoded models
//! - The search and dashboard controllers, behind view traits
//!
//! It is used by `weatherio-cli`, but can also be reused by other front ends.

pub mod client;
pub mod config;
pub mod controller;
pub mod endpoint;
pub mod model;
pub mod route;

pub use client::{ApiError, OpenWeatherClient, WeatherApi};
pub use config::Config;
pub use controller::{
    DashboardController, DashboardView, SearchController, SearchPhase, SearchResult, SearchView,
};
pub use endpoint::{ApiUrls, Endpoint};
pub use model::{
    AirQuality, Coordinate, CurrentConditions, Forecast, ForecastEntry, GeoLocation, to_local_time,
};
pub use route::{Route, RouteError};
