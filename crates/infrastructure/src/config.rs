//! Configuration loading.
//!
//! Layers, lowest priority first: the built-in defaults of `ClientConfig`,
//! an optional TOML or JSON file, then `TENANCY_*` environment variables.
//! Nested fields use `__`, e.g. `TENANCY_ENDPOINTS__LOGIN=/auth/login`.

use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File};
use tenancy_domain::{ClientConfig, DomainError};
use thiserror::Error;

/// Prefix of the environment variables read by [`load_config`].
pub const ENV_PREFIX: &str = "TENANCY";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The merged configuration is invalid.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] DomainError),
}

/// Loads and validates the client configuration.
///
/// # Errors
///
/// Returns `ConfigError::Load` if the file is missing or malformed, and
/// `ConfigError::Invalid` if the merged values fail validation.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    load_config_with_env(path, None)
}

/// Like [`load_config`], but reads variables from `env` instead of the
/// process environment when given.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_with_env(
    path: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> Result<ClientConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    let config: ClientConfig = builder.build()?.try_deserialize()?;
    config.validate()?;

    tracing::debug!(
        base_url = %config.base_url,
        environment = ?config.environment,
        "configuration loaded"
    );
    Ok(config)
}
