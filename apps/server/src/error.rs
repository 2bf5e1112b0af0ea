use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tickertrack_market_data::{AbortCause, MarketDataError, RetryClass};

/// Seconds a client is asked to wait before retrying a backoff-class failure.
pub const RETRY_AFTER_SECS: u64 = 60;

const DATA_UNAVAILABLE: &str = "data unavailable";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MarketData(#[from] MarketDataError),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::MarketData(e) => market_data_status(e),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
        });
        let mut response = (status, body).into_response();

        if let ApiError::MarketData(e) = &self {
            if e.retry_class() == RetryClass::WithBackoff {
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
            }
        }
        response
    }
}

/// Both terminal fetch outcomes look the same to the client; the logs tell
/// them apart.
fn market_data_status(err: &MarketDataError) -> (StatusCode, String) {
    match err {
        MarketDataError::AllKeysExhausted => {
            tracing::warn!(kind = "all_keys_exhausted", "Every API key is quota-limited");
            (StatusCode::SERVICE_UNAVAILABLE, DATA_UNAVAILABLE.to_string())
        }
        MarketDataError::Aborted(AbortCause::CredentialFieldInQuery { .. }) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        MarketDataError::Aborted(cause) => {
            tracing::error!(kind = "aborted", cause = %cause, "Market data fetch aborted");
            (StatusCode::SERVICE_UNAVAILABLE, DATA_UNAVAILABLE.to_string())
        }
        MarketDataError::SymbolNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        MarketDataError::ProviderError { .. } => (StatusCode::BAD_GATEWAY, err.to_string()),
        MarketDataError::InvalidConfig(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        MarketDataError::EmptyCredentialPool => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tickertrack_market_data::TransportError;

    fn respond(err: MarketDataError) -> Response {
        ApiError::from(err).into_response()
    }

    #[test]
    fn all_keys_exhausted_is_unavailable_with_retry_after() {
        let response = respond(MarketDataError::AllKeysExhausted);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "60");
    }

    #[test]
    fn timeout_is_unavailable_with_retry_after() {
        let response = respond(MarketDataError::Aborted(AbortCause::Transport(
            TransportError::Timeout,
        )));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key(RETRY_AFTER));
    }

    #[test]
    fn malformed_body_is_unavailable_without_retry_after() {
        let response = respond(MarketDataError::Aborted(AbortCause::Transport(
            TransportError::MalformedBody("expected value".into()),
        )));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!response.headers().contains_key(RETRY_AFTER));
    }

    #[test]
    fn credential_collision_is_bad_request() {
        let response = respond(MarketDataError::Aborted(
            AbortCause::CredentialFieldInQuery {
                field: "apikey".into(),
            },
        ));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn symbol_not_found_is_404() {
        let response = respond(MarketDataError::SymbolNotFound("NOPE".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
