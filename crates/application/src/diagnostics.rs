//! Diagnostics hook
//!
//! Wraps the `DiagnosticsSink` port with the client's filtering rule:
//! network errors are only reported in production.

use std::sync::Arc;

use tenancy_domain::{ApiRequest, Environment, NormalizedError};

use crate::ports::{Breadcrumb, BreadcrumbLevel, DiagnosticsSink, ErrorReport};

const HTTP: &str = "http";
const AUTH: &str = "auth";

/// Records breadcrumbs and filtered error reports.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticsSink>,
    environment: Environment,
}

impl Diagnostics {
    /// Creates a hook forwarding to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn DiagnosticsSink>, environment: Environment) -> Self {
        Self { sink, environment }
    }

    /// Records that `request` is about to be sent.
    pub fn request(&self, request: &ApiRequest) {
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            trace_id = %request.context.trace_id,
            "sending request"
        );
        self.sink.breadcrumb(
            Breadcrumb::info(HTTP, format!("{} {}", request.method, request.path))
                .with_data("trace_id", request.context.trace_id.clone()),
        );
    }

    /// Records the start of a token refresh.
    pub fn refresh_started(&self, trace_id: &str) {
        self.sink.breadcrumb(
            Breadcrumb::info(AUTH, "token refresh started").with_data("trace_id", trace_id),
        );
    }

    /// Records a successful token refresh.
    pub fn refresh_succeeded(&self, trace_id: &str) {
        self.sink.breadcrumb(
            Breadcrumb::info(AUTH, "token refresh succeeded").with_data("trace_id", trace_id),
        );
    }

    /// Records a failed token refresh.
    pub fn refresh_failed(&self, trace_id: &str, error: &NormalizedError) {
        self.sink.breadcrumb(
            Breadcrumb::info(AUTH, "token refresh failed")
                .with_level(BreadcrumbLevel::Error)
                .with_data("trace_id", trace_id)
                .with_data("code", error.code.clone()),
        );
    }

    /// Returns true if `error` should be forwarded as a report.
    ///
    /// Only final outcomes reach this hook; a 401 that is recovered by a
    /// refresh never does.
    #[must_use]
    pub fn should_report(&self, error: &NormalizedError) -> bool {
        !error.is_network() || self.environment.is_production()
    }

    /// Reports a failed request, subject to [`Self::should_report`].
    pub fn failure(&self, request: &ApiRequest, error: &NormalizedError) {
        if !self.should_report(error) {
            return;
        }
        self.sink.report(ErrorReport {
            error: error.clone(),
            method: request.method,
            path: request.path.clone(),
            trace_id: request.context.trace_id.clone(),
        });
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}
