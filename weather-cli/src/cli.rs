use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use tracing::debug;
use weather_core::{
    Config, Dashboard, DashboardState, IpGeolocator, Query, Units, ViewMode, WeatherError,
    geolocation::Geolocator, provider_from_config, render, view::LOADING_LABEL,
};

use crate::session;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Log request details to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and default units.
    Configure,

    /// Show current conditions, forecast and air quality for a city.
    Show {
        /// City name, e.g. "New York" or "Paris,FR".
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,

        /// metric (°C) or imperial (°F); defaults to the configured units.
        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,

        /// Only print the current conditions readout.
        #[arg(long)]
        minimal: bool,
    },

    /// Current conditions only, with a single request.
    Now {
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,

        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,
    },

    /// Show the weather at this machine's approximate location.
    Here {
        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,

        #[arg(long)]
        minimal: bool,
    },

    /// Interactive dashboard: search repeatedly, switch units, revisit recent cities.
    Session {
        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,

        /// Skip the initial lookup of this machine's location.
        #[arg(long)]
        no_locate: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, units, minimal } => {
                let city = city_arg(&city)?;
                let config = Config::load()?;
                let query = Query::new(city, units.unwrap_or(config.units));
                let dash = build_dashboard(&config, query.units, false)?;

                eprintln!("{LOADING_LABEL}");
                let _ = dash.submit(&query).await;
                print_outcome(&dash.snapshot(), view_mode(minimal))
            }
            Command::Now { city, units } => {
                let city = city_arg(&city)?;
                let config = Config::load()?;
                let dash = build_dashboard(&config, units.unwrap_or(config.units), false)?;

                let _ = dash.quick(&city).await;
                print_outcome(&dash.snapshot(), ViewMode::Minimal)
            }
            Command::Here { units, minimal } => {
                let config = Config::load()?;
                let dash = build_dashboard(&config, units.unwrap_or(config.units), true)?;

                eprintln!("{LOADING_LABEL}");
                let _ = dash.locate().await;
                print_outcome(&dash.snapshot(), view_mode(minimal))
            }
            Command::Session { units, no_locate } => {
                let config = Config::load()?;
                let dash = build_dashboard(&config, units.unwrap_or(config.units), !no_locate)?;
                session::run(&dash, !no_locate).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Get one at https://openweathermap.org/api")
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    if config.api_key.is_none() {
        bail!("API key must not be empty");
    }

    let starting = Units::all()
        .iter()
        .position(|u| *u == config.units)
        .unwrap_or(0);
    config.units = Select::new("Default units:", Units::all().to_vec())
        .with_starting_cursor(starting)
        .prompt()
        .context("Failed to read units")?;

    config.save()?;
    let path = Config::config_file_path()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

pub fn build_dashboard(config: &Config, units: Units, locate: bool) -> anyhow::Result<Dashboard> {
    debug!(base_url = config.base_url(), %units, locate, "Building dashboard");
    let provider = provider_from_config(config)?;

    let geolocator: Option<Box<dyn Geolocator>> = if locate {
        Some(Box::new(IpGeolocator::from_config(config)?))
    } else {
        None
    };

    Ok(Dashboard::new(provider, geolocator, units))
}

/// Print the view, or fail with the dashboard's error message.
fn print_outcome(state: &DashboardState, mode: ViewMode) -> anyhow::Result<()> {
    if let Some(error) = state.error() {
        bail!("{error}");
    }

    print!("{}", render(state, mode));
    Ok(())
}

/// Join a multi-word city given as separate arguments.
fn city_arg(words: &[String]) -> Result<String, WeatherError> {
    let city = words.join(" ").trim().to_string();
    if city.is_empty() {
        Err(WeatherError::EmptyQuery)
    } else {
        Ok(city)
    }
}

fn view_mode(minimal: bool) -> ViewMode {
    if minimal {
        ViewMode::Minimal
    } else {
        ViewMode::Full
    }
}

pub fn parse_units(value: &str) -> Result<Units, String> {
    Units::try_from(value).map_err(|e| e.to_string())
}
