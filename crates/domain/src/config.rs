//! Client configuration
//!
//! Every field has a default so a config file only needs to override what
//! differs per deployment (usually just `base_url` and `environment`).

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};
use crate::request::DEFAULT_TRACE_HEADER;

/// Deployment environment; controls diagnostic noise filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local or staging use; network errors are not reported.
    #[default]
    Development,
    /// Production; every non-401 failure is reported.
    Production,
}

impl Environment {
    /// Returns true for production.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Keys under which tokens are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    /// Key of the access token.
    pub access_token: String,
    /// Key of the refresh token.
    pub refresh_token: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access_token: "accessToken".to_string(),
            refresh_token: "refreshToken".to_string(),
        }
    }
}

/// Paths of the authentication endpoints, relative to `base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
    /// Exchanges credentials for tokens.
    pub login: String,
    /// Exchanges a refresh token for new tokens.
    pub refresh: String,
    /// Invalidates the session server-side.
    pub logout: String,
    /// Returns the signed-in user.
    pub me: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login-v2".to_string(),
            refresh: "/auth/refresh-token".to_string(),
            logout: "/auth/logout".to_string(),
            me: "/auth/me-v2".to_string(),
        }
    }
}

/// Configuration for the API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Versioned API root, e.g. `https://api.example.com/api/v1`.
    pub base_url: String,
    /// Default per-request timeout.
    pub timeout_ms: u64,
    /// Lifetime margin under which a token counts as "should refresh".
    pub refresh_buffer_seconds: i64,
    /// Maximum number of requests queued behind an in-flight refresh.
    pub max_refresh_waiters: usize,
    /// How long a queued request waits for the in-flight refresh.
    pub refresh_wait_timeout_ms: u64,
    /// Deployment environment.
    pub environment: Environment,
    /// Header carrying the per-request trace id.
    pub trace_header: String,
    /// Token storage keys.
    pub storage: StorageKeys,
    /// Authentication endpoint paths.
    pub endpoints: AuthEndpoints,
    /// Route the UI navigates to when the session cannot be recovered.
    pub login_route: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/v1".to_string(),
            timeout_ms: 30_000,
            refresh_buffer_seconds: 300,
            max_refresh_waiters: 256,
            refresh_wait_timeout_ms: 15_000,
            environment: Environment::default(),
            trace_header: DEFAULT_TRACE_HEADER.to_string(),
            storage: StorageKeys::default(),
            endpoints: AuthEndpoints::default(),
            login_route: "/login".to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates the default configuration for `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parses `base_url`, normalised to end with `/` so paths join below it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUrl` if the URL does not parse or is not HTTP(S).
    pub fn parsed_base_url(&self) -> DomainResult<Url> {
        let mut url = Url::parse(self.base_url.trim())
            .map_err(|e| DomainError::InvalidUrl(format!("{e}: {}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DomainError::InvalidUrl(format!(
                "base URL must be http or https: {}",
                self.base_url
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> DomainResult<()> {
        self.parsed_base_url()?;

        if self.timeout_ms == 0 {
            return Err(DomainError::InvalidConfig(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.refresh_wait_timeout_ms == 0 {
            return Err(DomainError::InvalidConfig(
                "refresh_wait_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_refresh_waiters == 0 {
            return Err(DomainError::InvalidConfig(
                "max_refresh_waiters must be greater than zero".to_string(),
            ));
        }
        if self.refresh_buffer_seconds < 0 {
            return Err(DomainError::InvalidConfig(
                "refresh_buffer_seconds must not be negative".to_string(),
            ));
        }
        if self.trace_header.trim().is_empty() {
            return Err(DomainError::InvalidHeaderName(
                "trace_header must not be empty".to_string(),
            ));
        }
        if self.storage.access_token.is_empty()
            || self.storage.refresh_token.is_empty()
            || self.storage.access_token == self.storage.refresh_token
        {
            return Err(DomainError::InvalidConfig(
                "storage keys must be non-empty and distinct".to_string(),
            ));
        }
        for path in [
            &self.endpoints.login,
            &self.endpoints.refresh,
            &self.endpoints.logout,
            &self.endpoints.me,
        ] {
            if !path.starts_with('/') {
                return Err(DomainError::InvalidPath(format!(
                    "endpoint must start with '/': {path:?}"
                )));
            }
        }
        Ok(())
    }
}
