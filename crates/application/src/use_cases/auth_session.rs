//! Sign-in, sign-out and the current user.

use std::sync::Arc;

use tenancy_domain::request::AUTHORIZATION;
use tenancy_domain::{ApiRequest, Credentials, LoginResponse, NormalizedError, UserProfile};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::pipeline::bearer;

/// Use case for managing the signed-in session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    client: Arc<ApiClient>,
}

impl AuthSession {
    /// Creates a new `AuthSession` over `client`.
    #[must_use]
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Exchanges credentials for tokens and stores them.
    ///
    /// # Errors
    ///
    /// Returns the server's error for rejected credentials, or
    /// `INVALID_RESPONSE` if the response carries no access token.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<UserProfile> {
        let request = ApiRequest::post(self.client.config().endpoints.login.clone())
            .skip_auth()
            .with_json(credentials)?;

        let response: LoginResponse = self.client.request_json(request).await?;
        if response.tokens.access_token.trim().is_empty() {
            return Err(NormalizedError::invalid_response(
                200,
                "Login response did not contain an access token",
            ));
        }

        self.client.token_store().store_pair(&response.tokens).await;
        tracing::info!(user_id = %response.user.id, role = %response.user.role, "signed in");
        Ok(response.user)
    }

    /// Ends the session.
    ///
    /// The server is told on a best-effort basis; the local tokens are
    /// cleared regardless of the outcome. A 401 here never triggers a
    /// refresh.
    pub async fn logout(&self) {
        let store = self.client.token_store();
        if let Some(token) = store.access_token().await {
            let request = ApiRequest::post(self.client.config().endpoints.logout.clone())
                .skip_auth()
                .with_header(AUTHORIZATION, bearer(&token));
            if let Err(error) = self.client.send(request).await {
                tracing::warn!(%error, "server-side logout failed; clearing local session anyway");
            }
        }
        store.clear().await;
        tracing::info!("signed out");
    }

    /// Fetches the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `SESSION_EXPIRED` if the session cannot be recovered.
    pub async fn current_user(&self) -> ApiResult<UserProfile> {
        let path = self.client.config().endpoints.me.clone();
        self.client.get(&path).await
    }

    /// Returns true if a non-expired access token is stored.
    pub async fn is_authenticated(&self) -> bool {
        self.client.token_store().has_valid_access_token().await
    }
}
