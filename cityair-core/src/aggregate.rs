//! Geocode → (weather ‖ air quality) → one dashboard document.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    AggregateError, Config,
    model::{
        AggregatedResult, AirQualityHourly, AirQualityNow, AirQualityPayload, ChartSeries, Coords,
        CurrentWeather, PlaceResolution, WeatherPayload,
    },
    provider::{
        AirQualitySource, Geocoder, NominatimGeocoder, OpenMeteoAirQuality, OpenMeteoWeather,
        WeatherSource,
    },
    series::{latest_value, now_minute},
};

#[derive(Debug, Clone)]
pub struct Aggregator {
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherSource>,
    air_quality: Arc<dyn AirQualitySource>,
}

impl Aggregator {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherSource>,
        air_quality: Arc<dyn AirQualitySource>,
    ) -> Self {
        Self {
            geocoder,
            weather,
            air_quality,
        }
    }

    /// Wire up the Nominatim and Open-Meteo clients described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            Arc::new(NominatimGeocoder::from_config(config)?),
            Arc::new(OpenMeteoWeather::from_config(config)?),
            Arc::new(OpenMeteoAirQuality::from_config(config)?),
        ))
    }

    pub async fn aggregate(&self, query: &str) -> Result<AggregatedResult, AggregateError> {
        self.aggregate_at(query, Utc::now()).await
    }

    /// Same as [`Aggregator::aggregate`] with an explicit "now" for the
    /// air-quality snapshot.
    pub async fn aggregate_at(
        &self,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<AggregatedResult, AggregateError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AggregateError::InvalidQuery);
        }

        let place = self
            .geocoder
            .resolve(query)
            .await
            .inspect_err(|e| tracing::warn!(query, error = %e, "Geocoding failed"))?
            .ok_or_else(|| AggregateError::NotFound(query.to_string()))?;

        let (weather, air) = tokio::try_join!(
            self.weather.fetch_weather(place.latitude, place.longitude),
            self.air_quality.fetch_air_quality(place.latitude, place.longitude),
        )
        .inspect_err(|e| tracing::warn!(query, error = %e, "Series fetch failed"))?;

        let result = assemble(place, weather, air, now);
        tracing::info!(query, city = %result.city, "Aggregated city data");
        Ok(result)
    }
}

/// Reshape the three upstream payloads into the dashboard document.
pub fn assemble(
    place: PlaceResolution,
    weather: WeatherPayload,
    air: AirQualityPayload,
    now: DateTime<Utc>,
) -> AggregatedResult {
    let current = weather
        .current
        .map(|c| CurrentWeather {
            temperature_c: c.temperature_2m,
            humidity_pct: c.relative_humidity_2m,
            wind_speed_kmh: c.wind_speed_10m,
        })
        .unwrap_or_default();

    let air_hourly = air.hourly.unwrap_or_default();
    let aq_now = air_quality_now(&air_hourly, &now_minute(now));

    let weather_hourly = weather.hourly.unwrap_or_default();
    let series = ChartSeries {
        time: weather_hourly.time,
        temp_c: weather_hourly.temperature_2m,
        pm2_5: air_hourly.pm2_5,
        pm10: air_hourly.pm10,
    };

    AggregatedResult {
        city: place.display_name,
        coords: Coords {
            lat: place.latitude,
            lon: place.longitude,
        },
        current,
        aq_now,
        series,
    }
}

fn air_quality_now(hourly: &AirQualityHourly, now: &str) -> AirQualityNow {
    let latest = |values: &[Option<f64>]| latest_value(&hourly.time, values, now);

    AirQualityNow {
        pm2_5: latest(&hourly.pm2_5),
        pm10: latest(&hourly.pm10),
        co: latest(&hourly.carbon_monoxide),
        o3: latest(&hourly.ozone),
        no2: latest(&hourly.nitrogen_dioxide),
        so2: latest(&hourly.sulphur_dioxide),
    }
}
