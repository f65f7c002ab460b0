use thiserror::Error;

/// Failures surfaced to the user by a single lookup action.
///
/// The display strings are what ends up in the dashboard's error banner, so they
/// stay short and free of transport details. Details are logged where the error
/// is produced.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Geocoding returned no match (or the by-name lookup was rejected).
    #[error("City not found")]
    NotFound,

    /// Any current/forecast/air-quality request failed.
    #[error("Failed to fetch weather data")]
    FetchFailed,

    /// Device location could not be determined.
    #[error("Could not retrieve location")]
    Unavailable,

    #[error("Please enter a city name")]
    EmptyQuery,

    #[error(
        "No OpenWeather API key configured.\n\
         Hint: run `weather configure` or set OPENWEATHER_API_KEY."
    )]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;
