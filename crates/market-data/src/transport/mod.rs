//! Transport abstraction for provider requests.
//!
//! The fetcher builds the URL, then hands the network I/O to a [`Transport`].
//! [`HttpTransport`] is the reqwest-backed implementation used in production;
//! tests substitute their own.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use reqwest::Url;

use crate::errors::TransportError;

/// An HTTP(S) GET capability.
///
/// Implementations return the raw response body of a successful request.
/// Non-success statuses, timeouts and connection failures are reported as
/// [`TransportError`]s.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: Url) -> Result<String, TransportError>;
}
