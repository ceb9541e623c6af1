//! Forward geocoding against Nominatim (OpenStreetMap).
//! Free, no API key, but the usage policy requires an identifying User-Agent.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{Config, FetchError, model::PlaceResolution};

use super::{Geocoder, ProviderId, fetch_json, http_client};

const PROVIDER: ProviderId = ProviderId::Nominatim;

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    endpoint: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            endpoint: config.endpoint(PROVIDER).to_string(),
            http: http_client(PROVIDER, config)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: Option<String>,
    lat: String,
    lon: String,
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, query: &str) -> Result<Option<PlaceResolution>, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        tracing::debug!(query, "Geocoding place name");

        let request = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json"), ("limit", "1")]);

        let places: Vec<NominatimPlace> = fetch_json(PROVIDER, request).await?;

        // Provider ranking is trusted as-is.
        let Some(top) = places.into_iter().next() else {
            tracing::debug!(query, "No geocoding match");
            return Ok(None);
        };

        let place = PlaceResolution {
            display_name: top.display_name.unwrap_or_else(|| query.to_string()),
            latitude: parse_coordinate("lat", &top.lat)?,
            longitude: parse_coordinate("lon", &top.lon)?,
        };

        tracing::debug!(name = %place.display_name, lat = place.latitude, lon = place.longitude, "Geocoded");
        Ok(Some(place))
    }
}

fn parse_coordinate(field: &str, raw: &str) -> Result<f64, FetchError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FetchError::Malformed {
            provider: PROVIDER,
            reason: format!("invalid {field} coordinate '{raw}'"),
        })
}
