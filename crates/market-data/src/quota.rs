//! Quota exhaustion detection.
//!
//! Providers signal an exhausted key inside an otherwise normal response
//! body. How they do it is provider-specific, so the fetcher only asks a
//! [`QuotaDetector`] and never inspects the payload itself.

use std::borrow::Cow;

use serde_json::Value;

/// Decides whether a parsed response says the credential is out of quota.
pub trait QuotaDetector: Send + Sync {
    fn is_quota_exhausted(&self, payload: &Value) -> bool;
}

impl<F> QuotaDetector for F
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn is_quota_exhausted(&self, payload: &Value) -> bool {
        self(payload)
    }
}

/// Exhausted when any of the configured top-level fields is present.
///
/// Non-object payloads (arrays, strings, null) never match.
#[derive(Clone, Debug)]
pub struct SentinelField {
    fields: Vec<Cow<'static, str>>,
}

impl SentinelField {
    pub fn new(field: impl Into<Cow<'static, str>>) -> Self {
        Self {
            fields: vec![field.into()],
        }
    }

    pub fn any_of<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Alpha Vantage answers HTTP 200 with an `"Information"` message once a
    /// key hits its daily limit; older responses used `"Note"` for the
    /// per-minute limit.
    pub fn alpha_vantage() -> Self {
        Self::any_of(["Information", "Note"])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.as_ref())
    }
}

impl Default for SentinelField {
    fn default() -> Self {
        Self::alpha_vantage()
    }
}

impl QuotaDetector for SentinelField {
    fn is_quota_exhausted(&self, payload: &Value) -> bool {
        match payload.as_object() {
            Some(obj) => self.fields.iter().any(|f| obj.contains_key(f.as_ref())),
            None => false,
        }
    }
}
