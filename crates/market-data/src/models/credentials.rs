use std::fmt;

use crate::errors::MarketDataError;

/// Ordered pool of provider API keys.
///
/// Keys are tried left to right, one attempt each. Duplicates are allowed and
/// kept in place. A pool always holds at least one key.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPool {
    keys: Vec<String>,
}

impl CredentialPool {
    /// Build a pool from a list of keys.
    ///
    /// Surrounding whitespace is trimmed and blank entries are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MarketDataError::EmptyCredentialPool`] if no key remains.
    pub fn new<I, S>(keys: I) -> Result<Self, MarketDataError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(MarketDataError::EmptyCredentialPool);
        }

        Ok(Self { keys })
    }

    /// Build a pool from a comma-separated list, e.g. `"K1, K2,K3"`.
    pub fn from_delimited(raw: &str) -> Result<Self, MarketDataError> {
        Self::new(raw.split(','))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    /// Keys in trial order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("len", &self.keys.len())
            .finish_non_exhaustive()
    }
}

/// Short, log-safe hint for a credential: `***` plus its last four characters.
pub(crate) fn credential_hint(key: &str) -> String {
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if key.chars().count() <= 4 {
        "***".to_string()
    } else {
        format!("***{}", tail)
    }
}
