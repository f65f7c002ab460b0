use crate::{
    Config,
    error::Result,
    model::{CurrentConditions, Location, Units, WeatherReport},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Data source behind the dashboard.
///
/// Implementations report failures with the user-facing kinds only
/// (`NotFound`, `FetchFailed`); anything more specific goes to the log.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Resolve a city name to coordinates using the single best match.
    async fn geocode(&self, city: &str) -> Result<Location>;

    /// One-shot current conditions looked up by name.
    async fn current_by_name(&self, city: &str, units: Units) -> Result<CurrentConditions>;

    /// Current conditions, forecast and air quality for a location, all or nothing.
    async fn report(&self, location: &Location, units: Units) -> Result<WeatherReport>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;
    let provider =
        OpenWeatherProvider::with_base_url(api_key, config.base_url(), config.timeout())?;

    Ok(Box::new(provider))
}
