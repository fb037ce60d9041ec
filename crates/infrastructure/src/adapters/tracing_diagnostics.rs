//! Diagnostics sink emitting `tracing` events.

use tenancy_application::ports::{Breadcrumb, BreadcrumbLevel, DiagnosticsSink, ErrorReport};

/// Forwards breadcrumbs and error reports to the `tracing` subscriber.
///
/// Breadcrumbs are logged under the `tenancy::breadcrumb` target and
/// reports under `tenancy::report`, so a subscriber can route them to an
/// error tracker.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl TracingDiagnostics {
    /// Creates a new sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DiagnosticsSink for TracingDiagnostics {
    fn breadcrumb(&self, crumb: Breadcrumb) {
        let data = format!("{:?}", crumb.data);
        match crumb.level {
            BreadcrumbLevel::Info => tracing::debug!(
                target: "tenancy::breadcrumb",
                category = crumb.category,
                data = %data,
                "{}",
                crumb.message
            ),
            BreadcrumbLevel::Warning => tracing::warn!(
                target: "tenancy::breadcrumb",
                category = crumb.category,
                data = %data,
                "{}",
                crumb.message
            ),
            BreadcrumbLevel::Error => tracing::error!(
                target: "tenancy::breadcrumb",
                category = crumb.category,
                data = %data,
                "{}",
                crumb.message
            ),
        }
    }

    fn report(&self, report: ErrorReport) {
        tracing::error!(
            target: "tenancy::report",
            code = %report.error.code,
            status = report.error.http_status,
            origin = ?report.error.origin,
            method = %report.method,
            path = %report.path,
            trace_id = %report.trace_id,
            "{}",
            report.error.message
        );
    }
}
