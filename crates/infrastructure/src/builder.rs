//! Assembles an `ApiClient` from the default adapters.

use std::path::PathBuf;
use std::sync::Arc;

use tenancy_application::ports::{
    Clock, DiagnosticsSink, HttpTransport, NoopSessionListener, SessionListener, TokenStorage,
    TransportError,
};
use tenancy_application::{ApiClient, ClientDependencies, MemoryTokenStorage};
use tenancy_domain::{ClientConfig, DomainError};
use thiserror::Error;

use crate::adapters::{ReqwestTransport, SystemClock, TracingDiagnostics};
use crate::persistence::FileTokenStorage;

/// Errors raised while building a client.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] DomainError),

    /// The HTTP transport could not be created.
    #[error("failed to create HTTP transport: {0}")]
    Transport(#[from] TransportError),
}

/// Builder wiring adapters into an `ApiClient`.
///
/// Unset adapters default to the reqwest transport, in-memory token
/// storage, the system clock, `tracing` diagnostics and a listener that
/// ignores session events.
#[must_use]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    storage: Option<Arc<dyn TokenStorage>>,
    clock: Option<Arc<dyn Clock>>,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
    session_listener: Option<Arc<dyn SessionListener>>,
}

impl ClientBuilder {
    /// Starts a builder for `config`.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            storage: None,
            clock: None,
            diagnostics: None,
            session_listener: None,
        }
    }

    /// Uses a custom transport.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Uses a custom token storage medium.
    pub fn with_storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Persists tokens to the JSON file at `path`.
    pub fn with_token_file(self, path: impl Into<PathBuf>) -> Self {
        self.with_storage(Arc::new(FileTokenStorage::new(path)))
    }

    /// Uses a custom clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Uses a custom diagnostics sink.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Notifies `listener` when the session cannot be recovered.
    pub fn with_session_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.session_listener = Some(listener);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `BuildError` if the configuration is invalid or the default
    /// transport cannot be created.
    pub fn build(self) -> Result<ApiClient, BuildError> {
        self.config.validate()?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::from_config(&self.config)?),
        };

        let deps = ClientDependencies {
            transport,
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(MemoryTokenStorage::new())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
            diagnostics: self
                .diagnostics
                .unwrap_or_else(|| Arc::new(TracingDiagnostics::new())),
            session_listener: self
                .session_listener
                .unwrap_or_else(|| Arc::new(NoopSessionListener)),
        };

        tracing::info!(base_url = %self.config.base_url, "API client ready");
        ApiClient::new(self.config, deps).map_err(BuildError::from)
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
