//! Open-Meteo forecast and air-quality clients.
//!
//! Both return the upstream payload untouched apart from decoding; reshaping
//! happens in the aggregator.

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    Config, FetchError,
    model::{AirQualityPayload, WeatherPayload},
};

use super::{AirQualitySource, ProviderId, WeatherSource, fetch_json, http_client};

const CURRENT_METRICS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m";
const HOURLY_WEATHER_METRICS: &str = "temperature_2m,relative_humidity_2m";
const HOURLY_POLLUTANTS: &str =
    "pm2_5,pm10,carbon_monoxide,ozone,nitrogen_dioxide,sulphur_dioxide";

#[derive(Debug, Clone)]
pub struct OpenMeteoWeather {
    endpoint: String,
    past_days: u32,
    http: Client,
}

impl OpenMeteoWeather {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let id = ProviderId::OpenMeteo;
        Ok(Self {
            endpoint: config.endpoint(id).to_string(),
            past_days: config.past_days(),
            http: http_client(id, config)?,
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoWeather {
    async fn fetch_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherPayload, FetchError> {
        tracing::debug!(latitude, longitude, "Fetching weather");

        let request = self.http.get(&self.endpoint).query(&[
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("current", CURRENT_METRICS.to_string()),
            ("hourly", HOURLY_WEATHER_METRICS.to_string()),
            ("past_days", self.past_days.to_string()),
            ("timezone", "auto".to_string()),
            ("wind_speed_unit", "kmh".to_string()),
        ]);

        fetch_json(ProviderId::OpenMeteo, request).await
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoAirQuality {
    endpoint: String,
    past_days: u32,
    http: Client,
}

impl OpenMeteoAirQuality {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let id = ProviderId::OpenMeteoAirQuality;
        Ok(Self {
            endpoint: config.endpoint(id).to_string(),
            past_days: config.past_days(),
            http: http_client(id, config)?,
        })
    }
}

#[async_trait]
impl AirQualitySource for OpenMeteoAirQuality {
    async fn fetch_air_quality(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AirQualityPayload, FetchError> {
        tracing::debug!(latitude, longitude, "Fetching air quality");

        let request = self.http.get(&self.endpoint).query(&[
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("hourly", HOURLY_POLLUTANTS.to_string()),
            ("past_days", self.past_days.to_string()),
            ("timezone", "auto".to_string()),
        ]);

        fetch_json(ProviderId::OpenMeteoAirQuality, request).await
    }
}
