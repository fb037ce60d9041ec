//! Conversion of every failure into a `NormalizedError`.

use serde::Deserialize;
use serde_json::{Map, Value};
use tenancy_domain::{ApiResponse, NormalizedError};

use crate::ports::TransportError;

/// Error body the backend sends with 4xx/5xx responses.
#[derive(Debug, Default, Deserialize)]
struct ServerErrorBody {
    #[serde(default)]
    message: Option<ServerMessage>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<Value>,
}

/// Validation failures arrive as a list of messages.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerMessage {
    One(String),
    Many(Vec<String>),
}

impl ServerMessage {
    fn into_text(self) -> String {
        match self {
            Self::One(message) => message,
            Self::Many(messages) => messages.join(", "),
        }
    }
}

/// Maps responses and transport failures to the caller-facing error shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorNormalizer;

impl ErrorNormalizer {
    /// Normalizes a response with an error status.
    ///
    /// Bodies that are not the backend's error shape are ignored and the
    /// status-derived fallbacks are used instead.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> NormalizedError {
        let body = serde_json::from_slice::<ServerErrorBody>(&response.body).unwrap_or_else(|error| {
            if !response.body.is_empty() {
                tracing::debug!(status = response.status, %error, "error body is not in the expected shape");
            }
            ServerErrorBody::default()
        });

        NormalizedError::server(
            response.status,
            body.message.map(ServerMessage::into_text),
            body.code,
            body.details.and_then(details_map),
        )
    }

    /// Normalizes a failure below the HTTP layer.
    #[must_use]
    pub fn from_transport(error: &TransportError) -> NormalizedError {
        match error {
            TransportError::Timeout { timeout_ms } => NormalizedError::timeout(*timeout_ms),
            TransportError::Connection(_) | TransportError::Body(_) => {
                NormalizedError::network(error.to_string())
            }
            TransportError::InvalidRequest(_) | TransportError::Other(_) => {
                NormalizedError::client(error.to_string())
            }
        }
    }

    /// Normalizes a success response whose body does not match the expected schema.
    #[must_use]
    pub fn from_decode(status: u16, error: &serde_json::Error) -> NormalizedError {
        NormalizedError::invalid_response(status, format!("Unexpected response from server: {error}"))
    }
}

fn details_map(details: Value) -> Option<Map<String, Value>> {
    match details {
        Value::Null => None,
        Value::Object(map) => Some(map),
        other => {
            let mut map = Map::new();
            map.insert("errors".to_string(), other);
            Some(map)
        }
    }
}
