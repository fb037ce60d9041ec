//! Outgoing request preparation and token refresh.
//!
//! [`RequestPipeline`] runs an ordered list of named [`RequestStage`]s over
//! every request before it reaches the transport. [`RefreshCoordinator`]
//! guarantees a single refresh call no matter how many requests hit a 401
//! at once.

mod refresh;
mod request;
mod stage;

pub use refresh::{RefreshCoordinator, RefreshSettings};
pub use request::RequestPipeline;
pub use stage::{AttachAuthStage, AttachTraceStage, RequestStage, bearer};
