//! Status classification used when turning responses into results.

use serde::{Deserialize, Serialize};

/// An HTTP status as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// The status that triggers a token refresh.
    pub const UNAUTHORIZED: Self = Self(401);

    /// Wraps a numeric status.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns true for statuses the client hands back as `Ok` (2xx and 3xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 400
    }

    /// Returns true for 401.
    #[must_use]
    pub const fn is_unauthorized(self) -> bool {
        self.0 == Self::UNAUTHORIZED.0
    }

    /// Error code used when the server body carries none.
    #[must_use]
    pub const fn error_code(self) -> &'static str {
        match self.0 {
            400 => "BAD_REQUEST",
            401 => "UNAUTHORIZED",
            403 => "FORBIDDEN",
            404 => "NOT_FOUND",
            409 => "CONFLICT",
            422 => "VALIDATION_ERROR",
            429 => "RATE_LIMITED",
            500..=599 => "SERVER_ERROR",
            _ => "HTTP_ERROR",
        }
    }

    /// Reason phrase for the error statuses the backend is known to send.
    #[must_use]
    pub const fn reason(self) -> Option<&'static str> {
        let phrase = match self.0 {
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            409 => "Conflict",
            413 => "Payload Too Large",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => return None,
        };
        Some(phrase)
    }

    /// Message used when the server body carries none.
    #[must_use]
    pub fn fallback_message(self) -> String {
        self.reason().map_or_else(
            || format!("Request failed with status {}", self.0),
            str::to_string,
        )
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{} {reason}", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}
