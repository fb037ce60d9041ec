//! HTTP response types

mod api_response;
mod status;

pub use api_response::ApiResponse;
pub use status::StatusCode;
