//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the client core and the outside
//! world. Each port is a trait implemented by adapters in the
//! infrastructure layer, or by test doubles.

mod clock;
mod diagnostics;
mod http_transport;
mod session_listener;
mod token_storage;

pub use clock::Clock;
pub use diagnostics::{Breadcrumb, BreadcrumbLevel, DiagnosticsSink, ErrorReport, NoopDiagnostics};
pub use http_transport::{HttpTransport, TransportError};
pub use session_listener::{NoopSessionListener, SessionListener};
pub use token_storage::{StorageError, TokenStorage};
