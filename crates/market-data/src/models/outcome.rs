use serde_json::Value;

use crate::errors::{AbortCause, MarketDataError, TransportError};

/// Result of one attempt with one credential.
///
/// Only exists inside a single fetch call.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptResult {
    /// The provider answered without the quota sentinel.
    Success(Value),

    /// The provider reported this credential as quota-limited.
    QuotaExhausted,

    /// The attempt failed at the transport level.
    TransportError(TransportError),
}

/// Terminal result of a fetch, returned to the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// Payload of the first attempt that was not quota-limited.
    Success(Value),

    /// Every credential in the pool was quota-limited.
    AllKeysExhausted,

    /// The fetch stopped early.
    Aborted(AbortCause),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Short label used in logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::AllKeysExhausted => "all_keys_exhausted",
            Self::Aborted(_) => "aborted",
        }
    }

    /// Convert into a `Result` for `?`-style callers.
    pub fn into_result(self) -> Result<Value, MarketDataError> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::AllKeysExhausted => Err(MarketDataError::AllKeysExhausted),
            Self::Aborted(cause) => Err(MarketDataError::Aborted(cause)),
        }
    }
}
