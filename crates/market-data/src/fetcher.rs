//! Multi-key quota-fallback fetching.
//!
//! [`QuotaFallbackFetcher`] resolves one logical request into one payload by
//! trying the credentials of a [`CredentialPool`] in order:
//!
//! 1. Merge the query with credential `i` and issue the GET (bounded by the
//!    per-attempt timeout)
//! 2. Parse the body as JSON
//! 3. Quota sentinel present: move on to credential `i + 1`
//! 4. Anything else: return it as the payload
//!
//! Transport failures end the fetch immediately. They do not depend on the
//! credential, so moving to the next key would only hide the real cause.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, warn};
use reqwest::Url;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::diagnostics::{AttemptStatus, FetchDiagnostics};
use crate::errors::{AbortCause, MarketDataError, TransportError};
use crate::models::{credential_hint, AttemptResult, CredentialPool, FetchOutcome, QuerySpec};
use crate::quota::{QuotaDetector, SentinelField};
use crate::transport::{HttpTransport, Transport};

/// Alpha Vantage query endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Query parameter the provider reads the API key from.
pub const DEFAULT_CREDENTIAL_FIELD: &str = "apikey";

/// Default bound on a single attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetcher settings.
#[derive(Clone, Debug)]
pub struct FetcherConfig {
    /// Endpoint the query parameters are appended to.
    pub base_url: String,
    /// Name of the query parameter that carries the credential.
    pub credential_field: String,
    /// Upper bound on one network attempt; expiry counts as a transport error.
    pub attempt_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credential_field: DEFAULT_CREDENTIAL_FIELD.to_string(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

/// Fetches market data, falling back to the next API key on quota exhaustion.
///
/// Holds no per-fetch state: every call starts again from the first
/// credential, and concurrent calls do not interact. Share it through `Arc`.
pub struct QuotaFallbackFetcher {
    config: FetcherConfig,
    base_url: Url,
    transport: Arc<dyn Transport>,
    detector: Arc<dyn QuotaDetector>,
}

impl QuotaFallbackFetcher {
    /// Create a fetcher from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`MarketDataError::InvalidConfig`] if the base URL does not
    /// parse or the credential field name is blank.
    pub fn new(
        config: FetcherConfig,
        transport: Arc<dyn Transport>,
        detector: Arc<dyn QuotaDetector>,
    ) -> Result<Self, MarketDataError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            MarketDataError::InvalidConfig(format!("base URL '{}': {}", config.base_url, e))
        })?;

        if config.credential_field.trim().is_empty() {
            return Err(MarketDataError::InvalidConfig(
                "credential field name is empty".to_string(),
            ));
        }

        Ok(Self {
            config,
            base_url,
            transport,
            detector,
        })
    }

    /// Fetcher wired for Alpha Vantage: reqwest transport and the
    /// `Information` / `Note` quota sentinels.
    pub fn alpha_vantage(config: FetcherConfig) -> Result<Self, MarketDataError> {
        let transport = Arc::new(HttpTransport::new(config.attempt_timeout));
        Self::new(config, transport, Arc::new(SentinelField::alpha_vantage()))
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch `query`, trying each credential of `pool` in order.
    pub async fn fetch(&self, query: &QuerySpec, pool: &CredentialPool) -> FetchOutcome {
        self.fetch_with_cancel(query, pool, &CancellationToken::new())
            .await
    }

    /// Like [`fetch`](Self::fetch), but stops as soon as `cancel` fires.
    ///
    /// Cancellation drops the in-flight request and never starts another.
    pub async fn fetch_with_cancel(
        &self,
        query: &QuerySpec,
        pool: &CredentialPool,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        self.fetch_with_diagnostics(query, pool, cancel).await.0
    }

    /// Fetch and also return the ledger of attempts made.
    pub async fn fetch_with_diagnostics(
        &self,
        query: &QuerySpec,
        pool: &CredentialPool,
        cancel: &CancellationToken,
    ) -> (FetchOutcome, FetchDiagnostics) {
        let mut diagnostics = FetchDiagnostics::new();

        if query.contains(&self.config.credential_field) {
            warn!(
                "Rejected query carrying the reserved '{}' parameter",
                self.config.credential_field
            );
            return (
                FetchOutcome::Aborted(AbortCause::CredentialFieldInQuery {
                    field: self.config.credential_field.clone(),
                }),
                diagnostics,
            );
        }

        for (index, key) in pool.iter().enumerate() {
            if cancel.is_cancelled() {
                debug!("Fetch cancelled before trying key #{}", index);
                return (FetchOutcome::Aborted(AbortCause::Cancelled), diagnostics);
            }

            let hint = credential_hint(key);
            let started = Instant::now();
            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.attempt(query, key) => Some(result),
            };
            let elapsed = started.elapsed();

            match attempt {
                None => {
                    diagnostics.record(index, hint, AttemptStatus::Cancelled, elapsed);
                    debug!("Fetch cancelled while key #{} was in flight", index);
                    return (FetchOutcome::Aborted(AbortCause::Cancelled), diagnostics);
                }
                Some(AttemptResult::Success(payload)) => {
                    diagnostics.record(index, hint, AttemptStatus::Success, elapsed);
                    debug!(
                        "Market data fetched with key #{} of {} in {:?}",
                        index,
                        pool.len(),
                        elapsed
                    );
                    return (FetchOutcome::Success(payload), diagnostics);
                }
                Some(AttemptResult::QuotaExhausted) => {
                    diagnostics.record(index, hint.clone(), AttemptStatus::QuotaExhausted, elapsed);
                    warn!(
                        "API key #{} ({}) is quota exhausted, trying next key",
                        index, hint
                    );
                }
                Some(AttemptResult::TransportError(e)) => {
                    diagnostics.record(index, hint, AttemptStatus::Failed(e.to_string()), elapsed);
                    error!(
                        "Market data request failed on key #{}: {}. Diagnostics: {}",
                        index,
                        e,
                        diagnostics.summary()
                    );
                    return (
                        FetchOutcome::Aborted(AbortCause::Transport(e)),
                        diagnostics,
                    );
                }
            }
        }

        warn!(
            "All {} API keys exhausted. Diagnostics: {}",
            pool.len(),
            diagnostics.summary()
        );
        (FetchOutcome::AllKeysExhausted, diagnostics)
    }

    /// One request with one credential.
    async fn attempt(&self, query: &QuerySpec, key: &str) -> AttemptResult {
        debug!("Market data request: {}", self.build_url(query, "***"));
        let url = self.build_url(query, key);

        let body = match tokio::time::timeout(self.config.attempt_timeout, self.transport.get(url))
            .await
        {
            Err(_) => return AttemptResult::TransportError(TransportError::Timeout),
            Ok(Err(e)) => return AttemptResult::TransportError(e),
            Ok(Ok(body)) => body,
        };

        let payload: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                return AttemptResult::TransportError(TransportError::MalformedBody(e.to_string()))
            }
        };

        if self.detector.is_quota_exhausted(&payload) {
            AttemptResult::QuotaExhausted
        } else {
            AttemptResult::Success(payload)
        }
    }

    fn build_url(&self, query: &QuerySpec, key: &str) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query.iter() {
                pairs.append_pair(name, value);
            }
            pairs.append_pair(&self.config.credential_field, key);
        }
        url
    }
}
