//! Per-call request metadata.

use serde::{Deserialize, Serialize};

use crate::id::generate_trace_id;

/// Metadata carried by a single logical API call.
///
/// A replay after a token refresh keeps the same context, so the original
/// attempt and its retry share one trace id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Identifier correlating logs and diagnostics for this call.
    pub trace_id: String,
    /// When true, no bearer token is attached and a 401 never triggers a refresh.
    pub skip_auth: bool,
    /// Per-call timeout; `None` uses the client default.
    pub timeout_ms: Option<u64>,
}

impl RequestContext {
    /// Creates an authenticated context with a fresh trace id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trace_id: generate_trace_id(),
            skip_auth: false,
            timeout_ms: None,
        }
    }

    /// Creates a context for calls that must not carry credentials.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            skip_auth: true,
            ..Self::new()
        }
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Returns the effective timeout given the client default.
    #[must_use]
    pub fn effective_timeout_ms(&self, default_ms: u64) -> u64 {
        self.timeout_ms.unwrap_or(default_ms)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_context_gets_its_own_trace_id() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert_ne!(a.trace_id, b.trace_id);
        assert!(!a.skip_auth);
    }

    #[test]
    fn test_anonymous_and_timeout() {
        let context = RequestContext::anonymous().with_timeout(2_000);
        assert!(context.skip_auth);
        assert_eq!(context.effective_timeout_ms(30_000), 2_000);
        assert_eq!(RequestContext::new().effective_timeout_ms(30_000), 30_000);
    }
}
