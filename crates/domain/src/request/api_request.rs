//! Logical API request.

use serde::Serialize;
use serde_json::Value;

use super::{HttpMethod, Headers, RequestContext};
use crate::error::{DomainError, DomainResult};

/// A request against the backend, expressed relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path below the base URL, starting with `/` (e.g. `/admin/residents`).
    pub path: String,
    /// Query parameters in order.
    pub query: Vec<(String, String)>,
    /// Request headers; auth and trace headers are added by the pipeline.
    pub headers: Headers,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Per-call metadata.
    pub context: RequestContext,
}

impl ApiRequest {
    /// Creates a request with a fresh authenticated context.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: None,
            context: RequestContext::new(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Creates a PATCH request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `body` and sets it as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBody` if serialization fails.
    pub fn with_json<T: Serialize + ?Sized>(self, body: &T) -> DomainResult<Self> {
        let value =
            serde_json::to_value(body).map_err(|e| DomainError::InvalidBody(e.to_string()))?;
        Ok(self.with_body(value))
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Marks the request as unauthenticated.
    #[must_use]
    pub const fn skip_auth(mut self) -> Self {
        self.context.skip_auth = true;
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.context.timeout_ms = Some(timeout_ms);
        self
    }

    /// Replaces the context, keeping everything else.
    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Checks that the path can be joined onto the API base URL.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPath` for paths that are empty, relative,
    /// absolute URLs, or contain whitespace.
    pub fn validate(&self) -> DomainResult<()> {
        let path = self.path.as_str();
        if !path.starts_with('/') {
            return Err(DomainError::InvalidPath(format!(
                "path must start with '/': {path:?}"
            )));
        }
        if path.contains("://") || path.starts_with("//") {
            return Err(DomainError::InvalidPath(format!(
                "path must be relative to the API base URL: {path:?}"
            )));
        }
        if path.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidPath(format!(
                "path must not contain whitespace: {path:?}"
            )));
        }
        Ok(())
    }
}
