//! Market data models
//!
//! This module contains the core data types for market data operations:
//! - `credentials` - Ordered pool of API keys (CredentialPool)
//! - `query` - Provider query parameters without the credential (QuerySpec)
//! - `outcome` - Per-attempt and terminal fetch results (AttemptResult, FetchOutcome)
//! - `quote` - Quote data structures (Quote)

mod credentials;
mod outcome;
mod query;
mod quote;

pub use credentials::CredentialPool;
pub(crate) use credentials::credential_hint;
pub use outcome::{AttemptResult, FetchOutcome};
pub use query::QuerySpec;
pub use quote::Quote;
