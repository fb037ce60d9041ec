//! Identifier generation.

use uuid::Uuid;

/// Generates a trace id for a single API call.
///
/// Ids are UUID v7 and sort by creation time.
#[must_use]
pub fn generate_trace_id() -> String {
    Uuid::now_v7().to_string()
}
