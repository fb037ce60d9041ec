//! Request and response schemas of the `/auth` endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::TokenPair;

/// Email and password submitted to the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of the refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    /// The stored refresh token.
    pub refresh_token: String,
}

/// The signed-in staff member, as returned by login and `me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Account identifier.
    pub id: String,
    /// Account email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role name, e.g. `admin` or `manager`.
    pub role: String,
    /// Permission keys granted through the role.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl UserProfile {
    /// Returns true if the user holds `permission`.
    #[must_use]
    pub fn can(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Response of the login endpoint: tokens plus the user they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Issued tokens.
    #[serde(flatten)]
    pub tokens: TokenPair,
    /// The authenticated user.
    pub user: UserProfile,
}
