//! Tenancy Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading,
//! logging setup and a builder that wires everything into an `ApiClient`.

pub mod adapters;
pub mod builder;
pub mod config;
pub mod logging;
pub mod persistence;

pub use adapters::{ReqwestTransport, SessionEvent, SessionEvents, SystemClock, TracingDiagnostics};
pub use builder::{BuildError, ClientBuilder};
pub use self::config::{ConfigError, ENV_PREFIX, load_config, load_config_with_env};
pub use logging::init_logging;
pub use persistence::FileTokenStorage;
