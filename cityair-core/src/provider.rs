use crate::{
    Config, FetchError,
    model::{AirQualityPayload, PlaceResolution, WeatherPayload},
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod nominatim;
pub mod open_meteo;

pub use nominatim::NominatimGeocoder;
pub use open_meteo::{OpenMeteoAirQuality, OpenMeteoWeather};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Nominatim,
    OpenMeteo,
    OpenMeteoAirQuality,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Nominatim => "nominatim",
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::OpenMeteoAirQuality => "open-meteo-air-quality",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::Nominatim,
            ProviderId::OpenMeteo,
            ProviderId::OpenMeteoAirQuality,
        ]
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderId::Nominatim => "https://nominatim.openstreetmap.org/search",
            ProviderId::OpenMeteo => "https://api.open-meteo.com/v1/forecast",
            ProviderId::OpenMeteoAirQuality => {
                "https://air-quality-api.open-meteo.com/v1/air-quality"
            }
        }
    }

    /// Geocoding answers are tiny; the hourly series are a week of data.
    pub fn default_timeout(&self) -> Duration {
        match self {
            ProviderId::Nominatim => Duration::from_secs(15),
            ProviderId::OpenMeteo | ProviderId::OpenMeteoAirQuality => Duration::from_secs(30),
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "nominatim" => Ok(ProviderId::Nominatim),
            "open-meteo" => Ok(ProviderId::OpenMeteo),
            "open-meteo-air-quality" => Ok(ProviderId::OpenMeteoAirQuality),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: nominatim, open-meteo, open-meteo-air-quality."
            )),
        }
    }
}

/// Resolves a free-text place name to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// `Ok(None)` means the provider found no match; that is not a failure.
    async fn resolve(&self, query: &str) -> Result<Option<PlaceResolution>, FetchError>;
}

#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherPayload, FetchError>;
}

#[async_trait]
pub trait AirQualitySource: Send + Sync + Debug {
    async fn fetch_air_quality(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AirQualityPayload, FetchError>;
}

/// Build the HTTP client for one provider, honouring config overrides.
pub(crate) fn http_client(id: ProviderId, config: &Config) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(config.timeout(id))
        .user_agent(config.user_agent())
        .build()
        .with_context(|| format!("Failed to build HTTP client for provider '{id}'"))
}

/// Send a request and decode a JSON body, classifying every failure by provider.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: ProviderId,
    request: RequestBuilder,
) -> Result<T, FetchError> {
    let res = request
        .send()
        .await
        .map_err(|source| FetchError::Request { provider, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| FetchError::Request { provider, source })?;

    if !status.is_success() {
        return Err(FetchError::Status {
            provider,
            status,
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| FetchError::Malformed {
        provider,
        reason: e.to_string(),
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
