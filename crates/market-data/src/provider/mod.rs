//! Provider-specific query builders and payload decoders.
//!
//! The fetcher is provider-agnostic: it only knows about credentials, a base
//! URL and a quota predicate. Modules here know what a provider's queries and
//! payloads look like, and turn raw payloads into [`Quote`](crate::Quote)s.

pub mod alpha_vantage;
