/// Classification for caller-side retry policy.
///
/// The fetcher never retries a terminal condition itself. This tells the
/// caller whether trying the same request again later can help.
///
/// | Class | Retry later? | Typical cause |
/// |-------|--------------|---------------|
/// | `Never` | No | bad symbol, bad query, cancellation |
/// | `WithBackoff` | Yes | every key quota-limited, timeout, connection failure, HTTP 429 or 5xx |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - the request itself is wrong or was deliberately stopped.
    Never,

    /// Retry after a delay.
    ///
    /// Quotas reset and networks recover; the same request may succeed once
    /// the caller has waited.
    WithBackoff,
}
