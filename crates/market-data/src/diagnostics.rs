//! Per-credential attempt tracking for fetch diagnostics.

use std::time::Duration;

/// What happened when a credential was tried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptStatus {
    /// The provider answered without the quota sentinel.
    Success,

    /// The provider reported the credential as quota-limited.
    QuotaExhausted,

    /// The attempt failed at the transport level.
    Failed(String),

    /// The caller cancelled while this attempt was in flight.
    Cancelled,
}

/// Record of a single credential attempt during a fetch.
#[derive(Clone, Debug)]
pub struct CredentialAttempt {
    /// Position of the credential in the pool.
    pub index: usize,
    /// Masked credential, safe to log.
    pub credential_hint: String,
    pub status: AttemptStatus,
    pub elapsed: Duration,
}

/// Ordered ledger of the attempts made by one fetch.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<CredentialAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        index: usize,
        credential_hint: String,
        status: AttemptStatus,
        elapsed: Duration,
    ) {
        self.attempts.push(CredentialAttempt {
            index,
            credential_hint,
            status,
            elapsed,
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        if self.attempts.is_empty() {
            return "no attempts".to_string();
        }

        self.attempts
            .iter()
            .map(|a| {
                let label = match &a.status {
                    AttemptStatus::Success => "SUCCESS".to_string(),
                    AttemptStatus::QuotaExhausted => "QUOTA".to_string(),
                    AttemptStatus::Failed(err) => format!("ERROR ({})", err),
                    AttemptStatus::Cancelled => "CANCELLED".to_string(),
                };
                format!("#{}({}): {}", a.index, a.credential_hint, label)
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    /// Check if any attempt succeeded.
    pub fn has_success(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.status == AttemptStatus::Success)
    }

    /// Number of credentials the provider reported as quota-limited.
    pub fn quota_exhausted_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.status == AttemptStatus::QuotaExhausted)
            .count()
    }

    /// Pool indices in the order they were tried.
    pub fn indices(&self) -> Vec<usize> {
        self.attempts.iter().map(|a| a.index).collect()
    }
}
