//! Request types: method, headers, per-call context and the request itself.

mod api_request;
mod context;
mod header;
mod method;

pub use api_request::ApiRequest;
pub use context::RequestContext;
pub use header::{AUTHORIZATION, DEFAULT_TRACE_HEADER, Header, Headers};
pub use method::HttpMethod;
