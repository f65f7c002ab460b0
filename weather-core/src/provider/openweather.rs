use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    config::{DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECS},
    error::{Result, WeatherError},
    forecast::{self, ForecastSample, unix_to_utc},
    model::{AirQualityReading, CurrentConditions, Location, Units, WeatherReport},
};

use super::WeatherProvider;

const GEOCODE_PATH: &str = "/geo/1.0/direct";
const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const AIR_POLLUTION_PATH: &str = "/data/2.5/air_pollution";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

/// Why a single request produced no usable body.
#[derive(Debug)]
enum RequestFailure {
    Status(StatusCode),
    Transport,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(
            api_key,
            DEFAULT_API_BASE_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_base_url(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> std::result::Result<T, RequestFailure> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "Failed to send request to OpenWeather");
                RequestFailure::Transport
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            warn!(%url, error = %e, "Failed to read OpenWeather response body");
            RequestFailure::Transport
        })?;

        if !status.is_success() {
            warn!(%url, %status, body = %truncate_body(&body), "OpenWeather request failed");
            return Err(RequestFailure::Status(status));
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!(%url, error = %e, "Failed to parse OpenWeather JSON");
            RequestFailure::Transport
        })
    }

    async fn fetch_current(&self, location: &Location, units: Units) -> Result<CurrentConditions> {
        let parsed: OwCurrentResponse = self
            .get_json(CURRENT_PATH, &coords_with_units(location, units))
            .await
            .map_err(|_| WeatherError::FetchFailed)?;

        parsed.into_conditions()
    }

    async fn fetch_forecast(
        &self,
        location: &Location,
        units: Units,
    ) -> Result<OwForecastResponse> {
        self.get_json(FORECAST_PATH, &coords_with_units(location, units))
            .await
            .map_err(|_| WeatherError::FetchFailed)
    }

    async fn fetch_air_quality(&self, location: &Location) -> Result<Option<AirQualityReading>> {
        let parsed: OwAirResponse = self
            .get_json(AIR_POLLUTION_PATH, &coords(location))
            .await
            .map_err(|_| WeatherError::FetchFailed)?;

        let index = parsed.list.first().map(|e| e.main.aqi);
        Ok(index.map(AirQualityReading::from_index))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn geocode(&self, city: &str) -> Result<Location> {
        let params = [("q", city.to_string()), ("limit", "1".to_string())];

        let matches: Vec<OwGeoMatch> = self
            .get_json(GEOCODE_PATH, &params)
            .await
            .map_err(|_| WeatherError::FetchFailed)?;

        let best = matches.into_iter().next().ok_or_else(|| {
            debug!(city, "Geocoding returned no match");
            WeatherError::NotFound
        })?;

        debug!(city, lat = best.lat, lon = best.lon, "Geocoded city");

        Ok(Location {
            latitude: best.lat,
            longitude: best.lon,
            name: best.name,
        })
    }

    async fn current_by_name(&self, city: &str, units: Units) -> Result<CurrentConditions> {
        let params = [
            ("q", city.to_string()),
            ("units", units.as_str().to_string()),
        ];

        let parsed: OwCurrentResponse =
            self.get_json(CURRENT_PATH, &params).await.map_err(|failure| match failure {
                RequestFailure::Status(status) => {
                    debug!(city, %status, "City rejected by current weather lookup");
                    WeatherError::NotFound
                }
                RequestFailure::Transport => WeatherError::FetchFailed,
            })?;

        parsed.into_conditions()
    }

    async fn report(&self, location: &Location, units: Units) -> Result<WeatherReport> {
        let (current, forecast_feed, air_quality) = tokio::try_join!(
            self.fetch_current(location, units),
            self.fetch_forecast(location, units),
            self.fetch_air_quality(location),
        )?;

        let utc_offset = forecast_feed
            .city
            .as_ref()
            .and_then(|c| c.timezone)
            .unwrap_or(0);
        let samples = forecast_feed.into_samples();

        Ok(WeatherReport {
            current,
            daily: forecast::daily(&samples),
            hourly: forecast::hourly(&samples, forecast::utc_offset(utc_offset)),
            air_quality,
            utc_offset,
        })
    }
}

fn coords(location: &Location) -> Vec<(&'static str, String)> {
    vec![
        ("lat", location.latitude.to_string()),
        ("lon", location.longitude.to_string()),
    ]
}

fn coords_with_units(location: &Location, units: Units) -> Vec<(&'static str, String)> {
    let mut params = coords(location);
    params.push(("units", units.as_str().to_string()));
    params
}

#[derive(Debug, Deserialize)]
struct OwGeoMatch {
    lat: f64,
    lon: f64,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OwWeather {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    sys: Option<OwSys>,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
}

impl OwCurrentResponse {
    fn into_conditions(self) -> Result<CurrentConditions> {
        let Some(weather) = self.weather.into_iter().next() else {
            warn!(name = %self.name, "OpenWeather current response has no weather entry");
            return Err(WeatherError::FetchFailed);
        };

        Ok(CurrentConditions {
            name: self.name,
            country: self.sys.and_then(|s| s.country),
            temperature: self.main.temp,
            description: weather.description,
            icon: weather.icon,
            humidity: self.main.humidity,
            wind_speed: self.wind.map(|w| w.speed),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    temp_max: Option<f64>,
    temp_min: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
    city: Option<OwCity>,
}

impl OwForecastResponse {
    fn into_samples(self) -> Vec<ForecastSample> {
        self.list
            .into_iter()
            .filter_map(|entry| {
                let timestamp = unix_to_utc(entry.dt)?;
                let weather = entry.weather.into_iter().next().unwrap_or_default();

                Some(ForecastSample {
                    timestamp,
                    temp: entry.main.temp,
                    temp_max: entry.main.temp_max.unwrap_or(entry.main.temp),
                    temp_min: entry.main.temp_min.unwrap_or(entry.main.temp),
                    icon: weather.icon,
                    description: weather.description,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct OwAqi {
    aqi: i64,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    main: OwAqi,
}

#[derive(Debug, Deserialize)]
struct OwAirResponse {
    #[serde(default)]
    list: Vec<OwAirEntry>,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
