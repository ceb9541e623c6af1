//! Core library for the `cityair` dashboard backend.
//!
//! This crate defines:
//! - Configuration & the client identifier sent upstream
//! - Abstraction over the geocoding, weather and air-quality providers
//! - Latest-value selection over hourly series
//! - The aggregator that reshapes three upstream payloads into one response
//!
//! It is used by `cityair-server`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod series;

pub use aggregate::Aggregator;
pub use config::{Config, ProviderConfig};
pub use error::{AggregateError, FetchError};
pub use model::{
    AggregatedResult, AirQualityNow, AqiBand, ChartSeries, Coords, CurrentWeather, PlaceResolution,
};
pub use provider::{AirQualitySource, Geocoder, ProviderId, WeatherSource};
