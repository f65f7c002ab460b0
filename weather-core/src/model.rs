use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, str::FromStr};

use crate::{air_quality::AirQuality, icon::WeatherIcon};

/// Unit system passed through to the API as `units=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial]
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(Units::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported units: metric (°C), imperial (°F)."
            )),
        }
    }
}

impl FromStr for Units {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Units::try_from(s)
    }
}

/// A single user lookup: free-text city plus the unit system to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub city: String,
    pub units: Units,
}

impl Query {
    pub fn new(city: impl Into<String>, units: Units) -> Self {
        Self {
            city: city.into(),
            units,
        }
    }
}

/// Coordinates resolved by geocoding or by the geolocation bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub name: String,
    pub country: Option<String>,
    pub temperature: f64,
    pub description: String,
    pub icon: String,
    pub humidity: Option<u8>,
    pub wind_speed: Option<f64>,
}

impl CurrentConditions {
    pub fn glyph(&self) -> WeatherIcon {
        WeatherIcon::from_code(&self.icon)
    }
}

/// One sample of the daily list (every 8th entry of the 3-hourly feed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub temp_max: f64,
    pub temp_min: f64,
    pub icon: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyEntry {
    pub time: String,
    pub temperature: i64,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirQualityReading {
    pub index: i64,
    pub quality: AirQuality,
}

impl AirQualityReading {
    pub fn from_index(index: i64) -> Self {
        Self {
            index,
            quality: AirQuality::from_index(index),
        }
    }
}

/// Everything the aggregator produces for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub daily: Vec<ForecastEntry>,
    pub hourly: Vec<HourlyEntry>,
    pub air_quality: Option<AirQualityReading>,
    /// City offset from UTC in seconds, as reported by the forecast feed.
    pub utc_offset: i32,
}

/// Round half up, so `2.5 -> 3` and `-2.5 -> -2`.
pub fn round_temperature(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
