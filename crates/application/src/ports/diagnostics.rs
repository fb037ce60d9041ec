//! Diagnostics sink port
//!
//! An external observability backend (error tracker, log shipper) receives
//! breadcrumbs and error reports through this trait.

use std::collections::BTreeMap;

use tenancy_domain::{HttpMethod, NormalizedError};

/// Severity of a breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreadcrumbLevel {
    /// Routine activity.
    Info,
    /// Something degraded but recovered.
    Warning,
    /// A failure.
    Error,
}

/// A small event recorded ahead of a possible error report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    /// Event family, e.g. `http` or `auth`.
    pub category: &'static str,
    /// Short description.
    pub message: String,
    /// Severity.
    pub level: BreadcrumbLevel,
    /// Structured fields.
    pub data: BTreeMap<String, String>,
}

impl Breadcrumb {
    /// Creates an info-level breadcrumb.
    #[must_use]
    pub fn info(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            level: BreadcrumbLevel::Info,
            data: BTreeMap::new(),
        }
    }

    /// Sets the level.
    #[must_use]
    pub const fn with_level(mut self, level: BreadcrumbLevel) -> Self {
        self.level = level;
        self
    }

    /// Adds a structured field.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// A failure forwarded to the observability backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    /// The normalized failure.
    pub error: NormalizedError,
    /// Method of the failing request.
    pub method: HttpMethod,
    /// Path of the failing request.
    pub path: String,
    /// Trace id of the failing request.
    pub trace_id: String,
}

/// Receives diagnostics events.
pub trait DiagnosticsSink: Send + Sync {
    /// Records a breadcrumb.
    fn breadcrumb(&self, crumb: Breadcrumb);

    /// Records an error report.
    fn report(&self, report: ErrorReport);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl DiagnosticsSink for NoopDiagnostics {
    fn breadcrumb(&self, _crumb: Breadcrumb) {}

    fn report(&self, _report: ErrorReport) {}
}
