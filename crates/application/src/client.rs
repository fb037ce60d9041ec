//! The authenticated API client.
//!
//! `ApiClient::send` runs a request through the pipeline and transport and,
//! when an authenticated request gets a 401, refreshes the session through
//! the [`RefreshCoordinator`] and replays the request exactly once.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tenancy_domain::request::AUTHORIZATION;
use tenancy_domain::{
    ApiRequest, ApiResponse, ClientConfig, DomainResult, NormalizedError, codes,
};

use crate::auth::TokenStore;
use crate::diagnostics::Diagnostics;
use crate::error::ApiResult;
use crate::normalizer::ErrorNormalizer;
use crate::pipeline::{RefreshCoordinator, RefreshSettings, RequestPipeline, bearer};
use crate::ports::{
    Clock, DiagnosticsSink, HttpTransport, SessionListener, TokenStorage, TransportError,
};

/// Adapters the client is wired to.
#[derive(Clone)]
pub struct ClientDependencies {
    /// Sends HTTP requests.
    pub transport: Arc<dyn HttpTransport>,
    /// Persists the tokens.
    pub storage: Arc<dyn TokenStorage>,
    /// Source of the current time.
    pub clock: Arc<dyn Clock>,
    /// Receives breadcrumbs and error reports.
    pub diagnostics: Arc<dyn DiagnosticsSink>,
    /// Notified when the user must sign in again.
    pub session_listener: Arc<dyn SessionListener>,
}

/// Client for the backend API.
pub struct ApiClient {
    config: ClientConfig,
    store: TokenStore,
    transport: Arc<dyn HttpTransport>,
    pipeline: RequestPipeline,
    coordinator: RefreshCoordinator,
    diagnostics: Diagnostics,
}

impl ApiClient {
    /// Creates a client with the standard pipeline.
    ///
    /// # Errors
    ///
    /// Returns the validation error if `config` is invalid.
    pub fn new(config: ClientConfig, deps: ClientDependencies) -> DomainResult<Self> {
        config.validate()?;

        let store = TokenStore::new(deps.storage, deps.clock, config.storage.clone());
        let diagnostics = Diagnostics::new(deps.diagnostics, config.environment);
        let pipeline = RequestPipeline::standard(&config, store.clone(), diagnostics.clone());
        let coordinator = RefreshCoordinator::new(
            store.clone(),
            deps.transport.clone(),
            pipeline.clone(),
            deps.session_listener,
            diagnostics.clone(),
            RefreshSettings::from_config(&config),
        );

        Ok(Self {
            config,
            store,
            transport: deps.transport,
            pipeline,
            coordinator,
            diagnostics,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the token store.
    #[must_use]
    pub const fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Returns the request pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Returns true while a token refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    /// Sends `request`, recovering from a single 401 by refreshing the session.
    ///
    /// # Errors
    ///
    /// Returns a `NormalizedError` for error statuses, transport failures,
    /// invalid requests and failed refreshes. The result of a replay after
    /// refresh is final.
    pub async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        if let Err(error) = request.validate() {
            let error = NormalizedError::from(error);
            self.diagnostics.failure(&request, &error);
            return Err(error);
        }

        let (sent, result) = self.attempt(request.clone()).await;
        match result {
            Ok(response) if response.is_unauthorized() && !request.context.skip_auth => {
                tracing::debug!(
                    path = %request.path,
                    trace_id = %request.context.trace_id,
                    "received 401; recovering session"
                );
                let sent_token = sent
                    .headers
                    .get(AUTHORIZATION)
                    .and_then(|value| value.strip_prefix("Bearer "))
                    .map(str::to_string);
                self.recover(request, sent_token).await
            }
            result => self.classify(&sent, result),
        }
    }

    async fn attempt(
        &self,
        mut request: ApiRequest,
    ) -> (ApiRequest, Result<ApiResponse, TransportError>) {
        self.pipeline.prepare(&mut request).await;
        let timeout = Duration::from_millis(
            request
                .context
                .effective_timeout_ms(self.config.timeout_ms),
        );
        let result = self.transport.send(&request, timeout).await;
        (request, result)
    }

    /// Obtains a usable token and replays `request` once.
    async fn recover(
        &self,
        request: ApiRequest,
        sent_token: Option<String>,
    ) -> ApiResult<ApiResponse> {
        let token = match (self.store.access_token().await, sent_token) {
            (Some(current), sent) if sent.as_deref() != Some(current.as_str()) => {
                tracing::debug!(
                    trace_id = %request.context.trace_id,
                    "token changed while request was in flight; replaying without refresh"
                );
                current
            }
            // The session ended (failed refresh or logout) after this request was sent.
            (None, Some(_)) => {
                tracing::debug!(
                    trace_id = %request.context.trace_id,
                    "session ended while request was in flight"
                );
                return Err(self
                    .coordinator
                    .last_failure()
                    .unwrap_or_else(|| NormalizedError::session_expired(None)));
            }
            _ => match self.coordinator.refresh(&request.context.trace_id).await {
                Ok(token) => token,
                Err(error) => {
                    if error.code != codes::SESSION_EXPIRED {
                        self.diagnostics.failure(&request, &error);
                    }
                    return Err(error);
                }
            },
        };

        let mut replay = request;
        self.pipeline.prepare(&mut replay).await;
        replay.headers.set(AUTHORIZATION, bearer(&token));
        let timeout = Duration::from_millis(
            replay
                .context
                .effective_timeout_ms(self.config.timeout_ms),
        );
        let result = self.transport.send(&replay, timeout).await;
        self.classify(&replay, result)
    }

    fn classify(
        &self,
        request: &ApiRequest,
        result: Result<ApiResponse, TransportError>,
    ) -> ApiResult<ApiResponse> {
        let error = match result {
            Ok(response) if response.is_success() => return Ok(response),
            Ok(response) => ErrorNormalizer::from_response(&response),
            Err(error) => ErrorNormalizer::from_transport(&error),
        };
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            trace_id = %request.context.trace_id,
            code = %error.code,
            status = error.http_status,
            "request failed"
        );
        self.diagnostics.failure(request, &error);
        Err(error)
    }

    /// Sends `request` and decodes the JSON response into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`Self::send`] returns, plus `INVALID_RESPONSE` when the
    /// body does not match `T`.
    pub async fn request_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let summary = ApiRequest {
            body: None,
            ..request.clone()
        };
        let response = self.send(request).await?;
        response.json().map_err(|e| {
            tracing::warn!(
                method = %summary.method,
                path = %summary.path,
                status = response.status,
                error = %e,
                "response body does not match the expected schema"
            );
            let error = ErrorNormalizer::from_decode(response.status, &e);
            self.diagnostics.failure(&summary, &error);
            error
        })
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// See [`Self::request_json`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request_json(ApiRequest::get(path)).await
    }

    /// Sends a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::request_json`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.request_json(ApiRequest::post(path).with_json(body)?)
            .await
    }

    /// Sends a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::request_json`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.request_json(ApiRequest::put(path).with_json(body)?)
            .await
    }

    /// Sends a PATCH request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::request_json`].
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.request_json(ApiRequest::patch(path).with_json(body)?)
            .await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`Self::request_json`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request_json(ApiRequest::delete(path)).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStorage;
    use crate::ports::{NoopDiagnostics, NoopSessionListener};
    use crate::testing::{FixedClock, Harness, MockTransport, epoch, json_response};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::{Value, json};
    use tenancy_domain::{Environment, ErrorOrigin};

    const REFRESH: &str = "/auth/refresh-token";
    const RESIDENTS: &str = "/admin/residents";

    #[derive(Debug, Deserialize, PartialEq)]
    struct Resident {
        id: u64,
        name: String,
    }

    /// Backend that accepts only `Bearer A2` and rotates R1 into A2/R2.
    fn rotating_backend() -> MockTransport {
        MockTransport::new(|request| match request.path.as_str() {
            REFRESH => {
                if request.body == Some(json!({"refreshToken": "R1"})) {
                    json_response(200, json!({"accessToken": "A2", "refreshToken": "R2"}))
                } else {
                    json_response(401, json!({"message": "Invalid refresh token"}))
                }
            }
            _ if request.headers.get(AUTHORIZATION) == Some("Bearer A2") => {
                json_response(200, json!([{"id": 1, "name": "Ayse"}]))
            }
            _ => json_response(401, json!({"message": "Token expired"})),
        })
    }

    async fn signed_in(harness: &Harness, access: &str, refresh: &str) {
        harness
            .client
            .token_store()
            .set_tokens(access, Some(refresh))
            .await;
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let h = Harness::new(ClientConfig::default(), rotating_backend());
        signed_in(&h, "A2", "R2").await;

        let residents: Vec<Resident> = h.client.get(RESIDENTS).await.unwrap();

        assert_eq!(residents.len(), 1);
        assert_eq!(h.transport.calls_to(REFRESH), 0);
        assert!(h.diagnostics.reports.lock().is_empty());
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_replayed_once() {
        let h = Harness::new(ClientConfig::default(), rotating_backend());
        signed_in(&h, "A1", "R1").await;

        let residents: Vec<Resident> = h.client.get(RESIDENTS).await.unwrap();

        assert_eq!(
            residents,
            vec![Resident {
                id: 1,
                name: "Ayse".to_string()
            }]
        );
        assert_eq!(
            h.transport.auth_headers_for(RESIDENTS),
            vec![Some("Bearer A1".to_string()), Some("Bearer A2".to_string())]
        );
        assert_eq!(h.transport.calls_to(REFRESH), 1);

        let store = h.client.token_store();
        assert_eq!(store.access_token().await.as_deref(), Some("A2"));
        assert_eq!(store.refresh_token().await.as_deref(), Some("R2"));
        assert!(h.diagnostics.reports.lock().is_empty());
        assert!(h.listener.redirects.lock().is_empty());
    }

    #[tokio::test]
    async fn test_replay_keeps_trace_id_and_refresh_gets_its_own() {
        let h = Harness::new(ClientConfig::default(), rotating_backend());
        signed_in(&h, "A1", "R1").await;

        let request = ApiRequest::get(RESIDENTS);
        let trace_id = request.context.trace_id.clone();
        h.client.send(request).await.unwrap();

        let traces: Vec<_> = h
            .transport
            .sent()
            .iter()
            .map(|r| (r.path.clone(), r.headers.get("X-Request-ID").map(String::from)))
            .collect();
        assert_eq!(traces.len(), 3);
        assert_eq!(traces[0], (RESIDENTS.to_string(), Some(trace_id.clone())));
        assert_eq!(traces[2], (RESIDENTS.to_string(), Some(trace_id.clone())));

        let (path, refresh_trace) = &traces[1];
        assert_eq!(path, REFRESH);
        let refresh_trace = refresh_trace.as_deref().unwrap();
        assert!(!refresh_trace.is_empty());
        assert_ne!(refresh_trace, trace_id);
    }

    #[tokio::test]
    async fn test_second_401_is_final() {
        let transport = MockTransport::new(|request| match request.path.as_str() {
            REFRESH => json_response(200, json!({"accessToken": "A2"})),
            _ => json_response(401, json!({"message": "Account disabled"})),
        });
        let h = Harness::new(ClientConfig::default(), transport);
        signed_in(&h, "A1", "R1").await;

        let error = h.client.send(ApiRequest::get(RESIDENTS)).await.unwrap_err();

        assert_eq!(error.http_status, 401);
        assert_eq!(error.code, "UNAUTHORIZED");
        assert_eq!(error.message, "Account disabled");
        assert_eq!(h.transport.calls_to(RESIDENTS), 2);
        assert_eq!(h.transport.calls_to(REFRESH), 1);
        assert_eq!(h.diagnostics.reports.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_skip_auth_401_does_not_refresh() {
        let h = Harness::new(ClientConfig::default(), rotating_backend());
        signed_in(&h, "A1", "R1").await;

        let error = h
            .client
            .send(ApiRequest::post("/auth/login-v2").skip_auth())
            .await
            .unwrap_err();

        assert_eq!(error.http_status, 401);
        assert_eq!(h.transport.calls_to(REFRESH), 0);
        assert_eq!(
            h.transport.auth_headers_for("/auth/login-v2"),
            vec![None::<String>]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_401s_trigger_one_refresh() {
        let transport =
            rotating_backend().with_delay(REFRESH, Duration::from_millis(100));
        let h = Harness::new(ClientConfig::default(), transport);
        signed_in(&h, "A1", "R1").await;

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..10 {
            let client = h.client.clone();
            tasks.spawn(async move { client.send(ApiRequest::get(RESIDENTS)).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap().status, 200);
        }

        assert_eq!(h.transport.calls_to(REFRESH), 1);
        assert_eq!(h.transport.calls_to(RESIDENTS), 20);
        let replays = h
            .transport
            .auth_headers_for(RESIDENTS)
            .into_iter()
            .filter(|header| header.as_deref() == Some("Bearer A2"))
            .count();
        assert_eq!(replays, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_fails_every_request_identically() {
        let transport =
            rotating_backend().with_delay(REFRESH, Duration::from_millis(100));
        let h = Harness::new(ClientConfig::default(), transport);
        signed_in(&h, "A1", "R-revoked").await;

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..4 {
            let client = h.client.clone();
            tasks.spawn(async move { client.send(ApiRequest::get(RESIDENTS)).await });
        }
        let mut errors = Vec::new();
        while let Some(result) = tasks.join_next().await {
            errors.push(result.unwrap().unwrap_err());
        }

        assert_eq!(errors.len(), 4);
        assert!(errors.iter().all(|e| e.code == codes::SESSION_EXPIRED));
        assert!(errors.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(h.transport.calls_to(REFRESH), 1);
        assert_eq!(h.transport.calls_to(RESIDENTS), 4);
        assert_eq!(*h.listener.redirects.lock(), vec!["/login".to_string()]);
        assert_eq!(h.client.token_store().access_token().await, None);
        assert_eq!(h.client.token_store().refresh_token().await, None);

        let reports = h.diagnostics.reports.lock();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].path, REFRESH);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_sent_with_replaced_token_replays_without_refresh() {
        let transport = rotating_backend()
            .with_delay("/admin/bills", Duration::from_millis(300))
            .with_delay(REFRESH, Duration::from_millis(50));
        let h = Harness::new(ClientConfig::default(), transport);
        signed_in(&h, "A1", "R1").await;

        let slow = tokio::spawn({
            let client = h.client.clone();
            async move { client.send(ApiRequest::get("/admin/bills")).await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        h.client.send(ApiRequest::get(RESIDENTS)).await.unwrap();

        assert_eq!(slow.await.unwrap().unwrap().status, 200);
        assert_eq!(h.transport.calls_to(REFRESH), 1);
        assert_eq!(
            h.transport.auth_headers_for("/admin/bills"),
            vec![Some("Bearer A1".to_string()), Some("Bearer A2".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_401_after_failed_refresh_reuses_its_outcome() {
        let transport = rotating_backend()
            .with_delay("/admin/bills", Duration::from_millis(300))
            .with_delay(REFRESH, Duration::from_millis(50));
        let h = Harness::new(ClientConfig::default(), transport);
        signed_in(&h, "A1", "R-revoked").await;

        let slow = tokio::spawn({
            let client = h.client.clone();
            async move { client.send(ApiRequest::get("/admin/bills")).await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        let fast = h.client.send(ApiRequest::get(RESIDENTS)).await.unwrap_err();
        let slow = slow.await.unwrap().unwrap_err();

        assert_eq!(fast.code, codes::SESSION_EXPIRED);
        assert_eq!(slow, fast);
        assert_eq!(h.transport.calls_to(REFRESH), 1);
        assert_eq!(h.transport.calls_to("/admin/bills"), 1);
        assert_eq!(*h.listener.redirects.lock(), vec!["/login".to_string()]);
        assert_eq!(h.diagnostics.reports.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_401_after_logout_does_not_refresh() {
        let transport = rotating_backend().with_delay(RESIDENTS, Duration::from_millis(100));
        let h = Harness::new(ClientConfig::default(), transport);
        signed_in(&h, "A1", "R1").await;

        let (result, ()) = tokio::join!(
            h.client.send(ApiRequest::get(RESIDENTS)),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                h.client.token_store().clear().await;
            }
        );

        assert_eq!(result.unwrap_err().code, codes::SESSION_EXPIRED);
        assert_eq!(h.transport.calls_to(REFRESH), 0);
        assert!(h.listener.redirects.lock().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_normalized_and_reported() {
        let transport = MockTransport::new(|_| {
            json_response(
                422,
                json!({"message": "Invalid unit", "code": "UNIT_INVALID", "details": {"unit": "unknown"}}),
            )
        });
        let h = Harness::new(ClientConfig::default(), transport);

        let error = h
            .client
            .post::<_, Value>("/admin/residents", &json!({"unit": "Z-99"}))
            .await
            .unwrap_err();

        assert_eq!(error.code, "UNIT_INVALID");
        assert_eq!(error.message, "Invalid unit");
        assert_eq!(error.http_status, 422);
        assert_eq!(error.origin, ErrorOrigin::Server);
        assert_eq!(error.details.unwrap()["unit"], json!("unknown"));

        let reports = h.diagnostics.reports.lock();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].path, "/admin/residents");
    }

    #[tokio::test]
    async fn test_network_error_shape() {
        let transport =
            MockTransport::new(|_| Err(TransportError::Connection("connection refused".into())));
        let h = Harness::new(ClientConfig::default(), transport);

        let error = h.client.send(ApiRequest::get(RESIDENTS)).await.unwrap_err();

        assert_eq!(error.code, codes::NETWORK_ERROR);
        assert_eq!(error.http_status, 0);
        assert!(!error.message.is_empty());
        assert!(h.diagnostics.reports.lock().is_empty());
    }

    #[tokio::test]
    async fn test_network_errors_reported_in_production() {
        let transport = MockTransport::new(|_| Err(TransportError::Timeout { timeout_ms: 10 }));
        let config = ClientConfig {
            environment: Environment::Production,
            ..ClientConfig::default()
        };
        let h = Harness::new(config, transport);

        let error = h
            .client
            .send(ApiRequest::get(RESIDENTS).with_timeout(10))
            .await
            .unwrap_err();

        assert!(error.is_network());
        assert_eq!(h.transport.calls_to(RESIDENTS), 1);
        assert_eq!(h.diagnostics.reports.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_path_is_never_sent() {
        let h = Harness::new(ClientConfig::default(), rotating_backend());

        let error = h
            .client
            .send(ApiRequest::get("https://evil.example/steal"))
            .await
            .unwrap_err();

        assert_eq!(error.code, codes::UNKNOWN_ERROR);
        assert_eq!(error.origin, ErrorOrigin::Client);
        assert!(h.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_invalid_response() {
        let transport = MockTransport::new(|_| json_response(200, json!({"items": []})));
        let h = Harness::new(ClientConfig::default(), transport);

        let error = h.client.get::<Vec<Resident>>(RESIDENTS).await.unwrap_err();

        assert_eq!(error.code, codes::INVALID_RESPONSE);
        assert_eq!(error.http_status, 200);
        assert_eq!(h.diagnostics.reports.lock().len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let deps = ClientDependencies {
            transport: Arc::new(rotating_backend()),
            storage: Arc::new(MemoryTokenStorage::new()),
            clock: Arc::new(FixedClock::at(epoch())),
            diagnostics: Arc::new(NoopDiagnostics),
            session_listener: Arc::new(NoopSessionListener),
        };
        assert!(ApiClient::new(ClientConfig::new("not a url"), deps).is_err());
    }
}
