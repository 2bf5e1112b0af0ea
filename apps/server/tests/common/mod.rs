#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Query, State},
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tickertrack_server::{
    api::app_router,
    build_state,
    config::{AuthConfig, Config, MarketDataConfig},
};
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Keys the stub provider accepts; every other key is quota-limited.
pub const LIVE_KEYS: &[&str] = &["K3", "LIVE"];

pub struct StubServer {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
}

impl StubServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn alpha_vantage(
    State(hits): State<Arc<AtomicUsize>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    let key = params.get("apikey").map(String::as_str).unwrap_or_default();
    if !LIVE_KEYS.contains(&key) {
        return Json(json!({
            "Information": "Our standard API rate limit is 25 requests per day."
        }));
    }

    match params.get("function").map(String::as_str) {
        Some("GLOBAL_QUOTE") => Json(json!({
            "Global Quote": {
                "01. symbol": "IBM",
                "02. open": "190.0000",
                "03. high": "192.5000",
                "04. low": "189.7500",
                "05. price": "191.2000",
                "06. volume": "3141592",
                "07. latest trading day": "2025-05-19"
            }
        })),
        _ => Json(json!({"symbol": params.get("symbol"), "price": 191.2})),
    }
}

async fn broken(State(hits): State<Arc<AtomicUsize>>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}

async fn slow(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(60)).await;
    "{}"
}

async fn garbage(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    "<html>maintenance</html>"
}

/// Alpha Vantage lookalike: `/query` answers per key, `/broken` with HTTP
/// 500, `/garbage` with a non-JSON body, `/slow` not for a minute.
pub async fn spawn_provider() -> StubServer {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/query", get(alpha_vantage))
        .route("/broken", get(broken))
        .route("/garbage", get(garbage))
        .route("/slow", get(slow))
        .with_state(hits.clone());
    StubServer {
        addr: serve(app).await,
        hits,
    }
}

pub const ANON_KEY: &str = "anon-key";
pub const PASSWORD: &str = "correct horse";

fn session_body(email: &str) -> Value {
    json!({
        "access_token": "jwt-token",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh",
        "user": {"id": "user-1", "email": email, "user_metadata": {}}
    })
}

async fn token(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(ANON_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "No API key found"})))
            .into_response();
    }
    if body["password"] != PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
        )
            .into_response();
    }
    Json(session_body(body["email"].as_str().unwrap_or_default())).into_response()
}

async fn signup(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if email == "taken@example.com" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"code": 422, "error_code": "user_already_exists", "msg": "User already registered"})),
        )
            .into_response();
    }
    Json(session_body(email)).into_response()
}

/// GoTrue lookalike for the auth pass-through.
pub async fn spawn_auth_backend() -> SocketAddr {
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/signup", post(signup));
    serve(app).await
}

pub fn config(api_keys: &str, base_url: String, auth: Option<AuthConfig>) -> Config {
    Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        cors_allow: vec!["*".to_string()],
        request_timeout: Duration::from_secs(10),
        market_data: MarketDataConfig {
            api_keys: api_keys.to_string(),
            base_url: Some(base_url),
            attempt_timeout: Duration::from_secs(5),
        },
        auth,
    }
}

pub fn router(config: &Config) -> Router {
    let state = build_state(config).unwrap();
    app_router(state, config)
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    into_parts(response).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, HeaderMap, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    into_parts(response).await
}

async fn into_parts(response: Response) -> (StatusCode, HeaderMap, Value) {
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}
