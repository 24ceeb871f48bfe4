use std::{sync::Arc, time::Duration};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode};
use weather_kpi_core::{Config, OpenWeatherGateway, WeatherService};

use crate::{locations, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-kpi", version, about = "Weather dashboard and KPIs in the terminal")]
pub struct Cli {
    /// Log core activity (cache hits, provider calls) to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and cache settings.
    Configure,

    /// List the built-in quick-select locations.
    Locations,

    /// Search for a place by name and print its coordinates.
    Search {
        /// City name, optionally with state/country, e.g. "Paris, FR".
        query: String,

        #[arg(long, default_value_t = 5)]
        limit: u8,
    },

    /// Show current conditions, KPIs and forecast for a location.
    Show {
        #[command(flatten)]
        target: Target,

        /// Print the dashboard as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Refresh the dashboard periodically; cached data is reused within the TTL.
    Watch {
        #[command(flatten)]
        target: Target,

        /// Seconds between refreshes.
        #[arg(long, default_value_t = 300)]
        interval: u64,

        /// Stop after this many refreshes.
        #[arg(long)]
        count: Option<u32>,
    },
}

/// A named default location or explicit coordinates.
#[derive(Debug, Args)]
pub struct Target {
    /// Built-in location name (see `weather-kpi locations`).
    pub name: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Locations => {
                print!("{}", render::locations(locations::DEFAULT_LOCATIONS));
                Ok(())
            }
            Command::Search { query, limit } => {
                let config = Config::load()?;
                let gateway = gateway_from_config(&config)?;
                let matches = gateway.search_locations(&query, limit).await?;
                print!("{}", render::geo_matches(&matches));
                Ok(())
            }
            Command::Show { target, json } => {
                let (label, coordinate) =
                    locations::resolve(target.name.as_deref(), target.lat, target.lon)?;
                let service = service_from_config()?;

                let dash = service.dashboard(coordinate).await;

                if json {
                    println!("{}", serde_json::to_string_pretty(&dash)?);
                } else {
                    print!("{}", render::dashboard(&label, &dash));
                }

                // Nothing to show at all: surface the failure as the exit status.
                if let (Err(e), Err(_)) = (dash.current, dash.forecast) {
                    return Err(e).context("No weather data available");
                }
                Ok(())
            }
            Command::Watch { target, interval, count } => {
                if interval == 0 {
                    bail!("--interval must be at least 1 second");
                }
                let (label, coordinate) =
                    locations::resolve(target.name.as_deref(), target.lat, target.lon)?;
                let service = service_from_config()?;

                let mut ticker = tokio::time::interval(Duration::from_secs(interval));
                let mut rendered = 0u32;
                loop {
                    ticker.tick().await;
                    let dash = service.dashboard(coordinate).await;
                    print!("{}", render::dashboard(&label, &dash));
                    println!("{}", "-".repeat(60));

                    rendered += 1;
                    tracing::debug!(rendered, "dashboard refreshed");
                    if count.is_some_and(|c| rendered >= c) {
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }
    config.set_api_key(api_key);

    config.cache_ttl_secs = CustomType::<u64>::new("Cache TTL in seconds:")
        .with_default(config.cache_ttl_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()
        .context("Failed to read cache TTL")?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

fn gateway_from_config(config: &Config) -> anyhow::Result<OpenWeatherGateway> {
    let api_key = config.resolved_api_key()?;
    let gateway = OpenWeatherGateway::with_base_urls(
        api_key,
        config.request_timeout(),
        &config.base_url,
        &config.geo_base_url,
    )?;
    Ok(gateway)
}

fn service_from_config() -> anyhow::Result<WeatherService> {
    let config = Config::load()?;
    let gateway = gateway_from_config(&config)?;
    Ok(WeatherService::new(Arc::new(gateway), config.service_settings()))
}
