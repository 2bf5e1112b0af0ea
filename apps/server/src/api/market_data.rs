use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tickertrack_market_data::{IntradayInterval, QuerySpec, Quote};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Deserialize)]
struct SeriesParams {
    currency: Option<String>,
}

#[derive(Deserialize)]
struct IntradayParams {
    interval: Option<String>,
    currency: Option<String>,
}

/// Pass-through: forwards the caller's parameters and returns the payload as
/// the provider sent it.
async fn query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Value>> {
    if params.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one query parameter is required".to_string(),
        ));
    }
    let request: QuerySpec = params.into_iter().collect();

    let (outcome, diagnostics) = state
        .fetcher
        .fetch_with_diagnostics(&request, &state.pool, &state.shutdown)
        .await;
    tracing::debug!(
        outcome = outcome.kind(),
        attempts = diagnostics.attempt_count(),
        "Market data query: {}",
        diagnostics.summary()
    );

    Ok(Json(outcome.into_result()?))
}

async fn latest_quote(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<SeriesParams>,
) -> ApiResult<Json<Quote>> {
    let currency = params.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
    let quote = state.alpha_vantage.global_quote(&symbol, currency).await?;
    Ok(Json(quote))
}

async fn daily_series(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<SeriesParams>,
) -> ApiResult<Json<Vec<Quote>>> {
    let currency = params.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
    let quotes = state.alpha_vantage.daily_series(&symbol, currency).await?;
    Ok(Json(quotes))
}

async fn intraday_series(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<IntradayParams>,
) -> ApiResult<Json<Vec<Quote>>> {
    let interval: IntradayInterval = params.interval.as_deref().unwrap_or("5min").parse()?;
    let currency = params.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
    let quotes = state
        .alpha_vantage
        .intraday_series(&symbol, interval, currency)
        .await?;
    Ok(Json(quotes))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/market-data/query", get(query))
        .route("/market-data/quote/{symbol}", get(latest_quote))
        .route("/market-data/daily/{symbol}", get(daily_series))
        .route("/market-data/intraday/{symbol}", get(intraday_series))
}
