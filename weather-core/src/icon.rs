use serde::{Deserialize, Serialize};

/// Glyph shown next to a condition, keyed by OpenWeather icon code.
///
/// Only the codes below are recognised; everything else is `Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIcon {
    ClearDay,
    PartlyCloudyDay,
    Cloudy,
    Snowy,
    ClearNight,
    Warning,
}

impl WeatherIcon {
    pub fn from_code(code: &str) -> Self {
        match code {
            "01d" => Self::ClearDay,
            "02d" => Self::PartlyCloudyDay,
            "03d" => Self::Cloudy,
            "04d" => Self::Snowy,
            "01n" => Self::ClearNight,
            _ => Self::Warning,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::ClearDay => "☀",
            Self::PartlyCloudyDay => "🌦",
            Self::Cloudy => "☁",
            Self::Snowy => "🌨",
            Self::ClearNight => "🌙",
            Self::Warning => "⚠",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ClearDay => "Clear Day",
            Self::PartlyCloudyDay => "Partly Cloudy Day",
            Self::Cloudy => "Cloudy",
            Self::Snowy => "Snowy",
            Self::ClearNight => "Clear Night",
            Self::Warning => "Unknown",
        }
    }
}
