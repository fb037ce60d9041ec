//! Token pair and JWT expiry decoding.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Access and refresh credentials issued by login and refresh endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived bearer credential.
    pub access_token: String,
    /// Longer-lived credential used only to obtain a new access token.
    /// Absent when the server rotates the access token alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Authorization scheme, normally `Bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime of the access token in seconds, if the server reports it.
    #[serde(
        default,
        rename = "expiresIn",
        alias = "expiresInSeconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_in_seconds: Option<u64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenPair {
    /// Creates a bearer token pair with unknown lifetime.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            token_type: default_token_type(),
            expires_in_seconds: None,
        }
    }

    /// Returns true if a refresh token is present.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// Reasons a token could not be decoded as a JWT.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token does not have three dot-separated segments.
    #[error("token is not a JWT")]
    NotAJwt,

    /// The payload segment is not valid base64url.
    #[error("token payload is not valid base64url: {0}")]
    InvalidEncoding(String),

    /// The payload is not a JSON object.
    #[error("token payload is not a JSON object: {0}")]
    InvalidClaims(String),
}

/// Registered claims the client cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JwtClaims {
    /// Expiry as seconds since the Unix epoch.
    pub exp: Option<i64>,
    /// Issue time as seconds since the Unix epoch.
    pub iat: Option<i64>,
}

impl JwtClaims {
    /// Returns the expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Seconds until expiry at `now`; negative once expired.
    #[must_use]
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.exp.map(|exp| exp - now.timestamp())
    }

    /// True if `exp` is present and still in the future at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.seconds_remaining(now).is_some_and(|secs| secs > 0)
    }
}

/// Decodes the payload of a JWT without verifying its signature.
///
/// Signature verification is the server's job; the client only needs the
/// expiry to decide whether a token is worth sending.
///
/// # Errors
///
/// Returns a `TokenError` if the token is not a three-segment JWT or its
/// payload is not a base64url-encoded JSON object.
pub fn decode_claims(token: &str) -> Result<JwtClaims, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::NotAJwt);
    };
    if header.is_empty() || payload.is_empty() {
        return Err(TokenError::NotAJwt);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TokenError::InvalidEncoding(e.to_string()))?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| TokenError::InvalidClaims(e.to_string()))?;
    let Value::Object(claims) = value else {
        return Err(TokenError::InvalidClaims("expected an object".to_string()));
    };

    Ok(JwtClaims {
        exp: claims.get("exp").and_then(numeric_date),
        iat: claims.get("iat").and_then(numeric_date),
    })
}

/// `NumericDate` may be an integer or a float per RFC 7519.
#[allow(clippy::cast_possible_truncation)]
fn numeric_date(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
}
