//! Session token store with JWT expiry tracking.
//!
//! `TokenStore` owns the access/refresh pair. It persists through the
//! `TokenStorage` port and never fails: storage errors are logged and
//! treated as "no token", so a broken medium degrades to a signed-out client
//! instead of an error on every request.

use std::sync::Arc;

use tenancy_domain::{StorageKeys, TokenPair, decode_claims};

use crate::ports::{Clock, TokenStorage};

/// Shared handle to the session tokens.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
    clock: Arc<dyn Clock>,
    keys: StorageKeys,
}

impl TokenStore {
    /// Creates a store over `storage` using the given keys.
    #[must_use]
    pub fn new(storage: Arc<dyn TokenStorage>, clock: Arc<dyn Clock>, keys: StorageKeys) -> Self {
        Self {
            storage,
            clock,
            keys,
        }
    }

    /// Returns the stored access token.
    pub async fn access_token(&self) -> Option<String> {
        self.read(&self.keys.access_token).await
    }

    /// Returns the stored refresh token.
    pub async fn refresh_token(&self) -> Option<String> {
        self.read(&self.keys.refresh_token).await
    }

    /// Stores a new access token and, if given, a new refresh token.
    ///
    /// Passing `None` for `refresh` keeps the current refresh token, which
    /// supports servers that rotate only the access token.
    pub async fn set_tokens(&self, access: &str, refresh: Option<&str>) {
        self.write(&self.keys.access_token, access).await;
        if let Some(refresh) = refresh {
            self.write(&self.keys.refresh_token, refresh).await;
        }
    }

    /// Stores the tokens of an issued pair.
    pub async fn store_pair(&self, pair: &TokenPair) {
        self.set_tokens(&pair.access_token, pair.refresh_token.as_deref())
            .await;
    }

    /// Removes both tokens.
    pub async fn clear(&self) {
        for key in [&self.keys.access_token, &self.keys.refresh_token] {
            if let Err(error) = self.storage.remove(key).await {
                tracing::warn!(key = %key, %error, "failed to remove token from storage");
            }
        }
    }

    /// Returns true if `token` is a JWT whose `exp` lies in the future.
    ///
    /// Missing or malformed tokens are invalid; decoding never fails loudly.
    #[must_use]
    pub fn is_valid(&self, token: &str) -> bool {
        match decode_claims(token) {
            Ok(claims) => claims.is_valid_at(self.clock.now()),
            Err(error) => {
                tracing::debug!(%error, "token is not a decodable JWT");
                false
            }
        }
    }

    /// Returns true if the stored access token is valid.
    pub async fn has_valid_access_token(&self) -> bool {
        self.access_token()
            .await
            .is_some_and(|token| self.is_valid(&token))
    }

    /// Returns true if the stored access token expires within `buffer_seconds`.
    ///
    /// An absent token has nothing to refresh and returns false; a token
    /// without a readable expiry is treated as already expired.
    pub async fn should_refresh(&self, buffer_seconds: i64) -> bool {
        let Some(token) = self.access_token().await else {
            return false;
        };
        self.seconds_remaining(&token)
            .is_none_or(|remaining| remaining <= buffer_seconds)
    }

    /// Describes the stored access token for display.
    pub async fn status(&self, buffer_seconds: i64) -> TokenStatus {
        let Some(token) = self.access_token().await else {
            return TokenStatus::NotAuthenticated;
        };
        let can_refresh = self.refresh_token().await.is_some();

        match self.seconds_remaining(&token) {
            Some(remaining) if remaining > buffer_seconds => TokenStatus::Valid {
                seconds_remaining: remaining,
            },
            Some(remaining) if remaining > 0 => TokenStatus::Expiring {
                seconds_remaining: remaining,
                can_refresh,
            },
            _ => TokenStatus::Expired { can_refresh },
        }
    }

    fn seconds_remaining(&self, token: &str) -> Option<i64> {
        decode_claims(token)
            .ok()
            .and_then(|claims| claims.seconds_remaining(self.clock.now()))
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(error) => {
                tracing::warn!(key, %error, "failed to read token from storage; treating as absent");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) {
        if let Err(error) = self.storage.set(key, value).await {
            tracing::warn!(key, %error, "failed to persist token");
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// Status of the stored access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No access token is stored.
    NotAuthenticated,
    /// Token is valid and not expiring soon.
    Valid {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Token is valid but inside the refresh buffer.
    Expiring {
        /// Seconds until expiry.
        seconds_remaining: i64,
        /// Whether a refresh token is stored.
        can_refresh: bool,
    },
    /// Token has expired or has no readable expiry.
    Expired {
        /// Whether a refresh token is stored.
        can_refresh: bool,
    },
}

impl TokenStatus {
    /// Returns true if the token can still be sent.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. } | Self::Expiring { .. })
    }
}
