use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::main_lib::AppState;

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Readiness {
    api_keys: usize,
    auth_configured: bool,
}

async fn readyz(State(state): State<Arc<AppState>>) -> Json<Readiness> {
    Json(Readiness {
        api_keys: state.pool.len(),
        auth_configured: state.auth.is_some(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
