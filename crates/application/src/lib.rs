//! Tenancy Application - The authenticated request protocol
//!
//! This crate defines the application layer with:
//! - Port traits (transport, token storage, clock, diagnostics, session listener)
//! - The token store, request pipeline and single-flight refresh coordinator
//! - `ApiClient`, which ties them together with 401 recovery
//! - Use cases for the session and the admin collections

pub mod auth;
pub mod client;
pub mod diagnostics;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod testing;

pub use auth::{MemoryTokenStorage, TokenStatus, TokenStore};
pub use client::{ApiClient, ClientDependencies};
pub use diagnostics::Diagnostics;
pub use error::{ApiResult, NormalizedError};
pub use normalizer::ErrorNormalizer;
pub use pipeline::{
    AttachAuthStage, AttachTraceStage, RefreshCoordinator, RefreshSettings, RequestPipeline,
    RequestStage,
};
pub use ports::{
    Breadcrumb, BreadcrumbLevel, Clock, DiagnosticsSink, ErrorReport, HttpTransport,
    NoopDiagnostics, NoopSessionListener, SessionListener, StorageError, TokenStorage,
    TransportError,
};
pub use use_cases::{AdminResources, AuthSession};
