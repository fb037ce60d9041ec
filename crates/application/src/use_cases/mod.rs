//! Application use cases (business logic orchestration).

mod admin_resources;
mod auth_session;

pub use admin_resources::AdminResources;
pub use auth_session::AuthSession;
