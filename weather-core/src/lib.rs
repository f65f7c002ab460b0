//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider (geocoding, current conditions, forecast, air quality)
//! - Forecast shaping, icon and air-quality lookups
//! - Dashboard state with stale-response protection, and its text views
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod air_quality;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod forecast;
pub mod geolocation;
pub mod icon;
pub mod model;
pub mod provider;
pub mod recent;
pub mod view;

pub use air_quality::AirQuality;
pub use config::Config;
pub use dashboard::{Completion, Dashboard, DashboardState, Phase};
pub use error::WeatherError;
pub use geolocation::{Geolocator, IpGeolocator};
pub use icon::WeatherIcon;
pub use model::{
    AirQualityReading, CurrentConditions, ForecastEntry, HourlyEntry, Location, Query, Units,
    WeatherReport,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use recent::RecentCities;
pub use view::{ViewMode, render};
