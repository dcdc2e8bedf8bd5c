//! Forecast models served to clients and the cached lookup in front of the
//! upstream weather provider.

use crate::error::Error;
use crate::forecast_cache::ForecastCache;
use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Wind {
    /// Meteorological degrees
    pub direction: i64,
    /// Metres per second
    pub speed: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Precipitation {
    /// `"rain"`, `"snow"` or absent when nothing falls
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Millimetres
    pub precip: f64,
    /// Percent, 0 to 100
    pub probability: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Sun {
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Moon {
    pub moonrise: i64,
    pub moonset: i64,
    pub moon_phase: f64,
}

/// Conditions at a single point in time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub epoch_time: i64,
    pub weather_text: String,
    pub weather_icon: String,
    pub wind: Wind,
    pub cloud_cover: i64,
    pub precipitation: Precipitation,
    /// Degrees Celsius
    pub temperature: f64,
}

/// Aggregated conditions for one day.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyWeather {
    pub epoch_time: i64,
    pub weather_text: String,
    pub weather_icon: String,
    pub wind: Wind,
    pub cloud_cover: i64,
    pub precipitation: Precipitation,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub sun: Sun,
    pub moon: Moon,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Forecast {
    pub current: Weather,
    pub hourly: Vec<Weather>,
    pub daily: Vec<DailyWeather>,
}

/// Source of fresh forecasts, typically a remote weather API.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch_forecast(&self, lat: &str, lon: &str) -> Result<Forecast, Error>;
}

/// Answers forecast requests from the cache and falls back to the provider on a miss.
pub struct ForecastService {
    cache: ForecastCache<Forecast>,
    provider: Arc<dyn ForecastProvider>,
}

impl ForecastService {
    pub fn new(cache: ForecastCache<Forecast>, provider: Arc<dyn ForecastProvider>) -> Self {
        Self { cache, provider }
    }

    /// Returns the forecast for `lat`/`lon`. Failed upstream fetches are not cached.
    ///
    /// The cache is not locked across the fetch: concurrent misses for the same
    /// coordinates each hit the provider and each add an entry.
    pub async fn get_forecast(&self, lat: &str, lon: &str) -> Result<Forecast, Error> {
        if let Some(forecast) = self.cache.get(lat, lon) {
            debug!("Forecast cache hit for {lat};{lon}");
            return Ok(forecast);
        }

        debug!("Forecast cache miss for {lat};{lon}, fetching from provider");
        let forecast = self.provider.fetch_forecast(lat, lon).await?;
        self.cache.add(lat, lon, forecast.clone());

        Ok(forecast)
    }

    pub fn cache(&self) -> &ForecastCache<Forecast> {
        &self.cache
    }
}
