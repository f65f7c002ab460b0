//! Device location for the initial lookup.
//!
//! A terminal has no location permission prompt, so the device position is
//! approximated from the public IP address.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tracing::{debug, warn};

use crate::{
    Config,
    error::{Result, WeatherError},
    model::Location,
};

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    /// Current device coordinates, or `Unavailable`.
    async fn locate(&self) -> Result<Location>;
}

#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    http: Client,
}

/// Accepts both the ip-api.com (`lat`/`lon`) and ipapi.co (`latitude`/`longitude`) shapes.
#[derive(Debug, Deserialize)]
struct IpLocationResponse {
    status: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
}

impl IpGeolocator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.geolocation_url(), config.timeout())
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Location> {
        debug!(url = %self.url, "Looking up device location");

        let res = self.http.get(&self.url).send().await.map_err(|e| {
            warn!(error = %e, "Location request failed");
            WeatherError::Unavailable
        })?;

        if !res.status().is_success() {
            warn!(status = %res.status(), "Location service returned an error");
            return Err(WeatherError::Unavailable);
        }

        let body: IpLocationResponse = res.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse location response");
            WeatherError::Unavailable
        })?;

        if body.status.as_deref().is_some_and(|s| s != "success") {
            warn!(status = ?body.status, "Location service could not place this address");
            return Err(WeatherError::Unavailable);
        }

        match (body.lat.or(body.latitude), body.lon.or(body.longitude)) {
            (Some(latitude), Some(longitude)) => {
                debug!(latitude, longitude, city = ?body.city, "Device location resolved");
                Ok(Location { latitude, longitude, name: body.city })
            }
            _ => {
                warn!("Location response had no coordinates");
                Err(WeatherError::Unavailable)
            }
        }
    }
}
