//! Adapters implementing the application ports.

mod reqwest_transport;
mod session_events;
mod system_clock;
mod tracing_diagnostics;

pub use reqwest_transport::ReqwestTransport;
pub use session_events::{SessionEvent, SessionEvents};
pub use system_clock::SystemClock;
pub use tracing_diagnostics::TracingDiagnostics;
