//! Request preparation stages.

use async_trait::async_trait;
use tenancy_domain::ApiRequest;
use tenancy_domain::request::AUTHORIZATION;

use crate::auth::TokenStore;

/// A named step that mutates an outgoing request.
#[async_trait]
pub trait RequestStage: Send + Sync {
    /// Stable name used in logs and tests.
    fn name(&self) -> &'static str;

    /// Applies the stage to `request`.
    async fn apply(&self, request: &mut ApiRequest);
}

/// Formats a bearer credential.
#[must_use]
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Sets the trace header from the request context.
#[derive(Debug, Clone)]
pub struct AttachTraceStage {
    header: String,
}

impl AttachTraceStage {
    /// Creates a stage writing the trace id to `header`.
    #[must_use]
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

#[async_trait]
impl RequestStage for AttachTraceStage {
    fn name(&self) -> &'static str {
        "attach-trace"
    }

    async fn apply(&self, request: &mut ApiRequest) {
        let trace_id = request.context.trace_id.clone();
        request.headers.set(self.header.clone(), trace_id);
    }
}

/// Attaches the stored access token unless the request skips auth.
///
/// On authenticated requests a caller-supplied `Authorization` header is
/// replaced, or dropped when no token is stored. Requests that skip auth
/// are left untouched.
#[derive(Debug, Clone)]
pub struct AttachAuthStage {
    store: TokenStore,
}

impl AttachAuthStage {
    /// Creates a stage reading tokens from `store`.
    #[must_use]
    pub const fn new(store: TokenStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestStage for AttachAuthStage {
    fn name(&self) -> &'static str {
        "attach-auth"
    }

    async fn apply(&self, request: &mut ApiRequest) {
        if request.context.skip_auth {
            return;
        }
        match self.store.access_token().await {
            Some(token) => request.headers.set(AUTHORIZATION, bearer(&token)),
            None => {
                request.headers.remove(AUTHORIZATION);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStorage;
    use crate::testing::{FixedClock, epoch};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tenancy_domain::StorageKeys;

    fn store() -> TokenStore {
        TokenStore::new(
            Arc::new(MemoryTokenStorage::new()),
            Arc::new(FixedClock::at(epoch())),
            StorageKeys::default(),
        )
    }

    #[tokio::test]
    async fn test_trace_stage_uses_context_trace_id() {
        let mut request = ApiRequest::get("/admin/residents");
        AttachTraceStage::new("X-Request-ID").apply(&mut request).await;
        assert_eq!(
            request.headers.get("x-request-id"),
            Some(request.context.trace_id.as_str())
        );
    }

    #[tokio::test]
    async fn test_auth_stage_attaches_bearer() {
        let store = store();
        store.set_tokens("A1", Some("R1")).await;

        let mut request = ApiRequest::get("/admin/residents");
        AttachAuthStage::new(store).apply(&mut request).await;
        assert_eq!(request.headers.get(AUTHORIZATION), Some("Bearer A1"));
    }

    #[tokio::test]
    async fn test_auth_stage_without_token_sends_no_header() {
        let mut request = ApiRequest::get("/admin/residents").with_header(AUTHORIZATION, "Bearer old");
        AttachAuthStage::new(store()).apply(&mut request).await;
        assert_eq!(request.headers.get(AUTHORIZATION), None);
    }

    #[tokio::test]
    async fn test_auth_stage_respects_skip_auth() {
        let store = store();
        store.set_tokens("A1", None).await;

        let mut request = ApiRequest::post("/auth/login-v2").skip_auth();
        AttachAuthStage::new(store.clone()).apply(&mut request).await;
        assert!(!request.headers.contains(AUTHORIZATION));

        let mut request = ApiRequest::post("/auth/logout")
            .skip_auth()
            .with_header(AUTHORIZATION, bearer("A0"));
        AttachAuthStage::new(store).apply(&mut request).await;
        assert_eq!(request.headers.get(AUTHORIZATION), Some("Bearer A0"));
    }
}
