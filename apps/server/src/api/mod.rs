mod health;
mod market_data;

use std::{sync::Arc, time::Duration};

use axum::{http::HeaderValue, routing::post, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{auth, config::Config, main_lib::AppState};

/// Slack on top of the worst-case fetch so the fetcher's own verdict reaches
/// the client before the request timeout does.
const FETCH_MARGIN: Duration = Duration::from_secs(5);

/// Request timeout that never cuts a fallback short: at least one full
/// attempt per key plus [`FETCH_MARGIN`].
pub fn request_timeout(config: &Config, key_count: usize) -> Duration {
    let per_attempt = config.market_data.attempt_timeout;
    let attempts = u32::try_from(key_count).unwrap_or(u32::MAX);
    let worst_fetch = per_attempt.saturating_mul(attempts).saturating_add(FETCH_MARGIN);
    config.request_timeout.max(worst_fetch)
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let timeout = request_timeout(config, state.pool.len());
    if timeout > config.request_timeout {
        tracing::info!(
            "Request timeout raised to {:?} to cover {} key attempt(s)",
            timeout,
            state.pool.len()
        );
    }

    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                    None
                }
            })
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let api = Router::new()
        .merge(health::router())
        .merge(market_data::router())
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/login", post(auth::login));

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
}
