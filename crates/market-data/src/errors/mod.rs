//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`TransportError`]: Why a single network attempt failed
//! - [`AbortCause`]: Why a fetch ended early without trying every credential
//! - [`MarketDataError`]: The main error enum for `Result`-returning operations
//! - [`RetryClass`]: Classification for determining caller retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Failure of one network attempt.
///
/// Any of these ends the whole fetch: the condition does not depend on which
/// credential was used, so trying the next one would not help.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The attempt did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The provider answered with a non-success HTTP status.
    #[error("HTTP {status}")]
    HttpStatus {
        /// The HTTP status code returned
        status: u16,
    },

    /// The response body was not valid JSON.
    #[error("malformed response body: {0}")]
    MalformedBody(String),

    /// Any other transport-level failure.
    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            Self::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Why a fetch was aborted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbortCause {
    /// A network attempt failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The caller cancelled the fetch.
    #[error("fetch cancelled")]
    Cancelled,

    /// The query already carried the credential parameter, which the fetcher
    /// sets itself on every attempt.
    #[error("query must not contain the credential field '{field}'")]
    CredentialFieldInQuery {
        /// Name of the reserved parameter
        field: String,
    },
}

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which tells the caller whether waiting and retrying is worthwhile.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// A credential pool was built from an empty list.
    #[error("Credential pool is empty")]
    EmptyCredentialPool,

    /// Every credential in the pool was quota-limited by the provider.
    #[error("All API keys exhausted")]
    AllKeysExhausted,

    /// The fetch ended early; see the cause.
    #[error("Fetch aborted: {0}")]
    Aborted(AbortCause),

    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider answered, but not in a shape this crate understands.
    #[error("Provider error: {message}")]
    ProviderError {
        /// Description of what went wrong
        message: String,
    },

    /// Configuration could not be applied.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use tickertrack_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::AllKeysExhausted;
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::SymbolNotFound("INVALID".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Quotas reset over time
            Self::AllKeysExhausted => RetryClass::WithBackoff,

            Self::Aborted(AbortCause::Transport(
                TransportError::Timeout | TransportError::Connect(_),
            )) => RetryClass::WithBackoff,

            // Throttling and server-side failures clear up; other statuses do not
            Self::Aborted(AbortCause::Transport(TransportError::HttpStatus { status }))
                if *status == 429 || *status >= 500 =>
            {
                RetryClass::WithBackoff
            }

            Self::Aborted(_)
            | Self::EmptyCredentialPool
            | Self::SymbolNotFound(_)
            | Self::ProviderError { .. }
            | Self::InvalidConfig(_) => RetryClass::Never,
        }
    }
}

impl From<AbortCause> for MarketDataError {
    fn from(cause: AbortCause) -> Self {
        Self::Aborted(cause)
    }
}
