//! Tenancy Domain - Core types
//!
//! This crate defines the domain model of the Tenancy API client: tokens,
//! requests and responses, the normalized error shape, configuration and
//! the admin resources of the property-management backend.
//! All types here are pure Rust with no I/O dependencies.

pub mod api_error;
pub mod auth;
pub mod config;
pub mod error;
pub mod id;
pub mod pagination;
pub mod request;
pub mod resource;
pub mod response;

pub use api_error::{ErrorOrigin, NormalizedError, codes};
pub use auth::{
    Credentials, JwtClaims, LoginResponse, RefreshTokenRequest, TokenError, TokenPair,
    UserProfile, decode_claims,
};
pub use config::{AuthEndpoints, ClientConfig, Environment, StorageKeys};
pub use error::{DomainError, DomainResult};
pub use id::generate_trace_id;
pub use pagination::{Page, PageQuery};
pub use request::{ApiRequest, HttpMethod, RequestContext};
pub use resource::AdminResource;
pub use response::{ApiResponse, StatusCode};
