//! HTTP shell: one JSON endpoint in front of the aggregator.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use cityair_core::{AggregateError, AggregatedResult, Aggregator};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Debug, Deserialize)]
struct CityQuery {
    city: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(aggregator: Aggregator) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/api/city-data", get(city_data))
        .with_state(aggregator)
}

pub async fn serve(listener: TcpListener, aggregator: Aggregator) -> anyhow::Result<()> {
    axum::serve(listener, router(aggregator)).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "CityAir is running. Use GET /api/city-data?city=<name>."
}

async fn city_data(
    State(aggregator): State<Aggregator>,
    Query(query): Query<CityQuery>,
) -> Result<Json<AggregatedResult>, ApiError> {
    let city = query.city.unwrap_or_default();

    aggregator.aggregate(&city).await.map(Json).map_err(|err| {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(city = city.trim(), error = %err, "Aggregation failed");
        }
        (
            status,
            Json(ErrorBody {
                error: err.user_message(),
            }),
        )
    })
}

fn status_for(err: &AggregateError) -> StatusCode {
    match err {
        AggregateError::InvalidQuery => StatusCode::BAD_REQUEST,
        AggregateError::NotFound(_) => StatusCode::NOT_FOUND,
        AggregateError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cityair_core::{
        AirQualitySource, FetchError, Geocoder, PlaceResolution, ProviderId, WeatherSource,
        model::{AirQualityPayload, WeatherPayload},
    };
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug, Default)]
    struct Fake {
        place: Option<PlaceResolution>,
        series_fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for Fake {
        async fn resolve(&self, _query: &str) -> Result<Option<PlaceResolution>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.place.clone())
        }
    }

    #[async_trait]
    impl WeatherSource for Fake {
        async fn fetch_weather(&self, _lat: f64, _lon: f64) -> Result<WeatherPayload, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.series_fail {
                return Err(FetchError::Malformed {
                    provider: ProviderId::OpenMeteo,
                    reason: "truncated".into(),
                });
            }
            Ok(WeatherPayload::default())
        }
    }

    #[async_trait]
    impl AirQualitySource for Fake {
        async fn fetch_air_quality(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> Result<AirQualityPayload, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AirQualityPayload::default())
        }
    }

    fn springfield() -> PlaceResolution {
        PlaceResolution {
            display_name: "Springfield, Illinois".into(),
            latitude: 39.8,
            longitude: -89.6,
        }
    }

    /// Serve the router on an ephemeral port and return its base URL.
    async fn spawn(fake: Arc<Fake>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let aggregator = Aggregator::new(fake.clone(), fake.clone(), fake);
        tokio::spawn(serve(listener, aggregator));
        format!("http://{addr}")
    }

    async fn fetch(url: String) -> (u16, serde_json::Value) {
        let res = reqwest::get(url).await.unwrap();
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }

    #[tokio::test]
    async fn missing_or_blank_city_is_bad_request_without_upstream_calls() {
        let fake = Arc::new(Fake::default());
        let base = spawn(fake.clone()).await;

        for url in [
            format!("{base}/api/city-data"),
            format!("{base}/api/city-data?city="),
            format!("{base}/api/city-data?city=%20%20"),
        ] {
            let (status, body) = fetch(url).await;
            assert_eq!(status, 400);
            assert_eq!(body["error"], "city is required");
        }
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_city_is_not_found() {
        let fake = Arc::new(Fake::default());
        let base = spawn(fake.clone()).await;

        let (status, body) = fetch(format!("{base}/api/city-data?city=Atlantis")).await;

        assert_eq!(status, 404);
        assert_eq!(body["error"], "could not find 'Atlantis'");
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway_with_no_partial_payload() {
        let fake = Arc::new(Fake {
            place: Some(springfield()),
            series_fail: true,
            ..Default::default()
        });
        let base = spawn(fake).await;

        let (status, body) = fetch(format!("{base}/api/city-data?city=Springfield")).await;

        assert_eq!(status, 502);
        assert_eq!(body["error"], "upstream service unavailable");
        assert!(body.get("city").is_none());
    }

    #[tokio::test]
    async fn known_city_returns_aggregated_document() {
        let fake = Arc::new(Fake {
            place: Some(springfield()),
            ..Default::default()
        });
        let base = spawn(fake).await;

        let (status, body) = fetch(format!("{base}/api/city-data?city=Springfield")).await;

        assert_eq!(status, 200);
        assert_eq!(body["city"], "Springfield, Illinois");
        assert_eq!(body["coords"]["lat"], 39.8);
        assert_eq!(body["coords"]["lon"], -89.6);
        for key in ["current", "aq_now", "series"] {
            assert!(body.get(key).is_some(), "{key} missing");
        }
        assert!(body["current"]["temperature_c"].is_null());
    }

    #[tokio::test]
    async fn health_check_responds() {
        let base = spawn(Arc::new(Fake::default())).await;
        let res = reqwest::get(format!("{base}/")).await.unwrap();

        assert!(res.status().is_success());
        assert!(res.text().await.unwrap().contains("/api/city-data"));
    }

    #[test]
    fn error_taxonomy_maps_to_distinct_statuses() {
        assert_eq!(status_for(&AggregateError::InvalidQuery), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&AggregateError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        let upstream = AggregateError::Upstream(FetchError::Malformed {
            provider: ProviderId::Nominatim,
            reason: "x".into(),
        });
        assert_eq!(status_for(&upstream), StatusCode::BAD_GATEWAY);
    }
}
