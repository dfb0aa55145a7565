use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};

use weatherio_core::{
    Config, Coordinate, DashboardController, OpenWeatherClient, Route, SearchController,
    WeatherApi,
};

use crate::view::{TerminalDashboard, TerminalSearchView};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherio", version, about = "OpenWeatherMap dashboard in your terminal")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key.
    Configure,

    /// Search for a location by name.
    Search {
        /// Free-text query, e.g. "London" or "New York".
        query: String,
    },

    /// Render the full dashboard for a location.
    Show {
        /// Free-text location query; the first match wins.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        query: Option<String>,

        /// Latitude, paired with --lon.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude, paired with --lat.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Search { query } => search(&query).await,
            Command::Show { query, lat, lon } => show(query.as_deref(), lat, lon).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn client_from(config: &Config) -> Result<OpenWeatherClient> {
    Ok(OpenWeatherClient::new(config.api_urls()?, config.request_timeout())?)
}

async fn search(query: &str) -> Result<()> {
    let config = Config::load()?;
    let api = Arc::new(client_from(&config)?);
    let view = Arc::new(TerminalSearchView::new());

    let mut controller = SearchController::new(api, Arc::clone(&view), config.debounce());
    controller.on_input(query);

    view.wait_done(config.debounce() + config.load_timeout()).await
}

async fn show(query: Option<&str>, lat: Option<f64>, lon: Option<f64>) -> Result<()> {
    let config = Config::load()?;
    let api = Arc::new(client_from(&config)?);

    let coord = match (query, lat, lon) {
        (Some(query), _, _) => {
            let locations = api.search_locations(query).await?;
            let hit = locations
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("No location found for '{query}'"))?;

            println!("{}", hit.label());
            hit.coord
        }
        (None, Some(lat), Some(lon)) => Coordinate::new(lat, lon),
        _ => bail!("Provide either --query or both --lat and --lon"),
    };

    let view = Arc::new(TerminalDashboard::new());
    let controller = DashboardController::new(api, view, config.load_timeout());
    controller.update_weather(coord, Route::Weather(coord)).await;

    Ok(())
}
