//! Integration tests for `MeteoClient` against a mock HTTP server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nimbus_api::{ApiError, MeteoClient, WeatherDataSource};

fn client_for(server: &MockServer) -> MeteoClient {
    MeteoClient::new(&server.uri(), "nimbus-test", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn search_locations_parses_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "46.9480,7.4474"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "2661552", "name": "Bern", "region": "BE"},
            {"id": "2661602", "name": "Belp", "region": "BE"}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let results = client.search_locations("46.9480,7.4474").await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "2661552");
    assert_eq!(results[0].name, "Bern");
}

#[tokio::test]
async fn location_fetches_full_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/2661552"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "2661552",
            "hash": "u0m4",
            "name": "Bern",
            "region": "BE",
            "latitude": 46.948,
            "longitude": 7.4474,
            "timezone": "Europe/Zurich"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let location = client.location("2661552").await.unwrap();

    assert_eq!(location.hash, "u0m4");
    assert_eq!(location.timezone, "Europe/Zurich");
}

#[tokio::test]
async fn daily_forecasts_parse_now_block() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecasts/u0m4/daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "date": "2026-08-07",
                "symbol": "sun",
                "temperature_max": 27.0,
                "precipitation_probability": 5,
                "precipitation_sum": 0.0,
                "now": {"daypart": "day", "temperature": 24.0, "later_temperature": 16.0}
            },
            {
                "date": "2026-08-08",
                "symbol": "rain",
                "temperature_max": 21.0,
                "temperature_min": 14.5,
                "precipitation_probability": 80,
                "precipitation_sum": 6.2
            }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let days = client.daily_forecasts("u0m4").await.unwrap();

    assert_eq!(days.len(), 2);
    assert!(days[0].now.is_some());
    assert!(days[1].now.is_none());
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/observations/u0m4"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.observations("u0m4").await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 503 }));
}

#[tokio::test]
async fn malformed_body_maps_to_decode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/observations/u0m4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "sun"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.observations("u0m4").await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn connection_failure_maps_to_transport() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = MeteoClient::new(&uri, "nimbus-test", Duration::from_secs(1)).unwrap();
    let err = client.hourly_forecasts("u0m4").await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
}
