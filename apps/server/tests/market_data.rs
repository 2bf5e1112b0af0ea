mod common;

use std::time::Duration;

use axum::http::header::RETRY_AFTER;
use serde_json::json;

#[tokio::test]
async fn falls_back_to_third_key() {
    let provider = common::spawn_provider().await;
    let config = common::config("K1,K2,K3", provider.url("/query"), None);
    let app = common::router(&config);

    let (status, _, body) =
        common::get_json(app, "/api/v1/market-data/query?function=QUOTE&symbol=IBM").await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"symbol": "IBM", "price": 191.2}));
    assert_eq!(provider.hits(), 3);
}

#[tokio::test]
async fn first_live_key_stops_the_loop() {
    let provider = common::spawn_provider().await;
    let config = common::config("LIVE,K1,K2", provider.url("/query"), None);
    let app = common::router(&config);

    let (status, _, _) =
        common::get_json(app, "/api/v1/market-data/query?function=QUOTE&symbol=IBM").await;

    assert_eq!(status, 200);
    assert_eq!(provider.hits(), 1);
}

#[tokio::test]
async fn all_keys_exhausted_is_data_unavailable() {
    let provider = common::spawn_provider().await;
    let config = common::config("K1,K2", provider.url("/query"), None);
    let app = common::router(&config);

    let (status, headers, body) =
        common::get_json(app, "/api/v1/market-data/query?function=QUOTE&symbol=IBM").await;

    assert_eq!(status, 503);
    assert_eq!(body["message"], "data unavailable");
    assert_eq!(headers.get(RETRY_AFTER).unwrap(), "60");
    assert_eq!(provider.hits(), 2);
}

#[tokio::test]
async fn upstream_error_aborts_without_trying_next_key() {
    let provider = common::spawn_provider().await;
    let config = common::config("K1,K2,K3", provider.url("/broken"), None);
    let app = common::router(&config);

    let (status, headers, body) =
        common::get_json(app, "/api/v1/market-data/query?function=QUOTE&symbol=IBM").await;

    assert_eq!(status, 503);
    assert_eq!(body["message"], "data unavailable");
    assert!(headers.contains_key(RETRY_AFTER));
    assert_eq!(provider.hits(), 1);
}

#[tokio::test]
async fn malformed_body_aborts_without_retry_after() {
    let provider = common::spawn_provider().await;
    let config = common::config("K1,K2", provider.url("/garbage"), None);
    let app = common::router(&config);

    let (status, headers, _) =
        common::get_json(app, "/api/v1/market-data/query?function=QUOTE&symbol=IBM").await;

    assert_eq!(status, 503);
    assert!(!headers.contains_key(RETRY_AFTER));
    assert_eq!(provider.hits(), 1);
}

#[tokio::test]
async fn unreachable_provider_is_data_unavailable() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = common::config("K1", format!("http://{}/query", addr), None);
    let app = common::router(&config);

    let (status, _, body) =
        common::get_json(app, "/api/v1/market-data/query?function=QUOTE&symbol=IBM").await;

    assert_eq!(status, 503);
    assert_eq!(body["message"], "data unavailable");
}

#[tokio::test]
async fn credential_field_in_query_is_rejected() {
    let provider = common::spawn_provider().await;
    let config = common::config("K1,K3", provider.url("/query"), None);
    let app = common::router(&config);

    let (status, _, _) = common::get_json(
        app,
        "/api/v1/market-data/query?function=QUOTE&symbol=IBM&apikey=MINE",
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(provider.hits(), 0);
}

#[tokio::test]
async fn empty_query_is_rejected() {
    let provider = common::spawn_provider().await;
    let config = common::config("K3", provider.url("/query"), None);
    let app = common::router(&config);

    let (status, _, _) = common::get_json(app, "/api/v1/market-data/query").await;

    assert_eq!(status, 400);
    assert_eq!(provider.hits(), 0);
}

#[tokio::test]
async fn latest_quote_is_typed() {
    let provider = common::spawn_provider().await;
    let config = common::config("K1,K3", provider.url("/query"), None);
    let app = common::router(&config);

    let (status, _, body) =
        common::get_json(app, "/api/v1/market-data/quote/IBM?currency=USD").await;

    assert_eq!(status, 200);
    assert_eq!(body["close"], 191.2);
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["source"], "ALPHA_VANTAGE");
}

#[tokio::test]
async fn unknown_interval_is_bad_request() {
    let provider = common::spawn_provider().await;
    let config = common::config("K3", provider.url("/query"), None);
    let app = common::router(&config);

    let (status, _, _) =
        common::get_json(app, "/api/v1/market-data/intraday/IBM?interval=2min").await;

    assert_eq!(status, 400);
    assert_eq!(provider.hits(), 0);
}

#[tokio::test]
async fn hanging_provider_is_data_unavailable() {
    let provider = common::spawn_provider().await;
    let mut config = common::config("K1,K2", provider.url("/slow"), None);
    config.request_timeout = Duration::from_secs(1);
    config.market_data.attempt_timeout = Duration::from_secs(1);
    let app = common::router(&config);

    let (status, headers, body) =
        common::get_json(app, "/api/v1/market-data/query?function=QUOTE&symbol=IBM").await;

    assert_eq!(status, 503);
    assert_eq!(body["message"], "data unavailable");
    assert_eq!(headers.get(RETRY_AFTER).unwrap(), "60");
    assert_eq!(provider.hits(), 1);
}
