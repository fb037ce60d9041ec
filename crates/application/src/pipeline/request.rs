//! The request pipeline.

use std::sync::Arc;

use tenancy_domain::{ApiRequest, ClientConfig};

use super::stage::{AttachAuthStage, AttachTraceStage, RequestStage};
use crate::auth::TokenStore;
use crate::diagnostics::Diagnostics;

/// Ordered list of stages applied to every outgoing request.
#[derive(Clone)]
pub struct RequestPipeline {
    stages: Vec<Arc<dyn RequestStage>>,
    diagnostics: Diagnostics,
}

impl RequestPipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub const fn new(diagnostics: Diagnostics) -> Self {
        Self {
            stages: Vec::new(),
            diagnostics,
        }
    }

    /// Creates the standard pipeline: `attach-trace`, then `attach-auth`.
    #[must_use]
    pub fn standard(config: &ClientConfig, store: TokenStore, diagnostics: Diagnostics) -> Self {
        Self::new(diagnostics)
            .with_stage(AttachTraceStage::new(config.trace_header.clone()))
            .with_stage(AttachAuthStage::new(store))
    }

    /// Appends a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Names of the stages in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs every stage over `request` and records a breadcrumb.
    pub async fn prepare(&self, request: &mut ApiRequest) {
        for stage in &self.stages {
            stage.apply(request).await;
        }
        self.diagnostics.request(request);
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStorage;
    use crate::testing::{FixedClock, RecordingDiagnostics, epoch};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tenancy_domain::{Environment, StorageKeys};

    struct AcceptLanguage;

    #[async_trait]
    impl RequestStage for AcceptLanguage {
        fn name(&self) -> &'static str {
            "accept-language"
        }

        async fn apply(&self, request: &mut ApiRequest) {
            request.headers.set("Accept-Language", "tr");
        }
    }

    fn pipeline() -> (RequestPipeline, TokenStore, Arc<RecordingDiagnostics>) {
        let sink = Arc::new(RecordingDiagnostics::default());
        let store = TokenStore::new(
            Arc::new(MemoryTokenStorage::new()),
            Arc::new(FixedClock::at(epoch())),
            StorageKeys::default(),
        );
        let pipeline = RequestPipeline::standard(
            &ClientConfig::default(),
            store.clone(),
            Diagnostics::new(sink.clone(), Environment::Development),
        );
        (pipeline, store, sink)
    }

    #[test]
    fn test_standard_stage_order() {
        let (pipeline, _, _) = pipeline();
        assert_eq!(pipeline.stage_names(), vec!["attach-trace", "attach-auth"]);
    }

    #[tokio::test]
    async fn test_prepare_sets_headers_and_breadcrumb() {
        let (pipeline, store, sink) = pipeline();
        store.set_tokens("A1", None).await;

        let mut request = ApiRequest::get("/admin/bills");
        pipeline.prepare(&mut request).await;

        assert_eq!(request.headers.get("Authorization"), Some("Bearer A1"));
        assert_eq!(
            request.headers.get("X-Request-ID"),
            Some(request.context.trace_id.as_str())
        );
        assert_eq!(sink.breadcrumbs.lock()[0].message, "GET /admin/bills");
    }

    #[tokio::test]
    async fn test_custom_stage_runs_after_standard_ones() {
        let (pipeline, _, _) = pipeline();
        let pipeline = pipeline.with_stage(AcceptLanguage);
        assert_eq!(pipeline.stage_names().last(), Some(&"accept-language"));

        let mut request = ApiRequest::get("/admin/staff");
        pipeline.prepare(&mut request).await;
        assert_eq!(request.headers.get("accept-language"), Some("tr"));
    }
}
