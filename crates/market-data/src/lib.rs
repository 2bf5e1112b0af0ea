//! TickerTrack Market Data Crate
//!
//! This crate fetches market data from a quote API that limits usage per API
//! key, hiding those limits from the caller by falling back across a pool of
//! keys.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Ordered, exhaustive trial of a credential pool on quota exhaustion
//! - Bounded per-attempt timeouts and caller cancellation
//! - Pluggable transport and quota detection
//! - Typed Alpha Vantage queries (latest quote, daily and intraday series)
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |    QuerySpec     | --> |  CredentialPool  |  (ordered keys)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                       +----------------------+
//!                       | QuotaFallbackFetcher |  (one attempt per key)
//!                       +----------------------+
//!                           |              |
//!                           v              v
//!                  +-------------+  +---------------+
//!                  |  Transport  |  | QuotaDetector |
//!                  +-------------+  +---------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   FetchOutcome   |  (Success / AllKeysExhausted / Aborted)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`QuotaFallbackFetcher`] - Runs a query against each credential in turn
//! - [`CredentialPool`] - Ordered, non-empty list of API keys
//! - [`QuerySpec`] - Provider query parameters, excluding the credential
//! - [`FetchOutcome`] - Terminal result of one fetch
//! - [`FetchDiagnostics`] - Ledger of the attempts one fetch made
//! - [`Quote`] - Market data quote with OHLCV data

pub mod diagnostics;
pub mod errors;
pub mod fetcher;
pub mod models;
pub mod provider;
pub mod quota;
pub mod transport;

// Re-export all public types from models
pub use models::{AttemptResult, CredentialPool, FetchOutcome, QuerySpec, Quote};

pub use diagnostics::{AttemptStatus, CredentialAttempt, FetchDiagnostics};
pub use errors::{AbortCause, MarketDataError, RetryClass, TransportError};
pub use fetcher::{FetcherConfig, QuotaFallbackFetcher};
pub use provider::alpha_vantage::{AlphaVantageClient, IntradayInterval};
pub use quota::{QuotaDetector, SentinelField};
pub use transport::{HttpTransport, Transport};

// Cancellation handle taken by the fetch methods
pub use tokio_util::sync::CancellationToken;
