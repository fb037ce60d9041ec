//! Single-flight token refresh.
//!
//! The first caller to hit a 401 becomes the leader and performs the refresh
//! call; everyone arriving while it is in flight queues up as a waiter and
//! receives the leader's outcome, in arrival order. The state lives behind a
//! `parking_lot::Mutex` that is never held across an await point.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tenancy_domain::{
    ApiRequest, ClientConfig, NormalizedError, RefreshTokenRequest, RequestContext, TokenPair,
};
use tokio::sync::oneshot;

use super::RequestPipeline;
use crate::auth::TokenStore;
use crate::diagnostics::Diagnostics;
use crate::error::ApiResult;
use crate::normalizer::ErrorNormalizer;
use crate::ports::{HttpTransport, SessionListener};

type RefreshOutcome = ApiResult<String>;

/// Tunables of the coordinator, taken from `ClientConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSettings {
    /// Path of the refresh endpoint.
    pub endpoint: String,
    /// Route passed to the session listener when the refresh fails.
    pub login_route: String,
    /// Maximum number of queued waiters.
    pub max_waiters: usize,
    /// How long a waiter waits for the leader.
    pub wait_timeout: Duration,
    /// Timeout of the refresh call itself.
    pub request_timeout: Duration,
}

impl RefreshSettings {
    /// Extracts the refresh settings from the client configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            endpoint: config.endpoints.refresh.clone(),
            login_route: config.login_route.clone(),
            max_waiters: config.max_refresh_waiters,
            wait_timeout: Duration::from_millis(config.refresh_wait_timeout_ms),
            request_timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

enum RefreshState {
    Idle,
    InFlight {
        waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
    },
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

/// Coordinates token refreshes so that at most one is in flight.
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    last_failure: Mutex<Option<NormalizedError>>,
    store: TokenStore,
    transport: Arc<dyn HttpTransport>,
    pipeline: RequestPipeline,
    listener: Arc<dyn SessionListener>,
    diagnostics: Diagnostics,
    settings: RefreshSettings,
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new(
        store: TokenStore,
        transport: Arc<dyn HttpTransport>,
        pipeline: RequestPipeline,
        listener: Arc<dyn SessionListener>,
        diagnostics: Diagnostics,
        settings: RefreshSettings,
    ) -> Self {
        Self {
            state: Mutex::new(RefreshState::Idle),
            last_failure: Mutex::new(None),
            store,
            transport,
            pipeline,
            listener,
            diagnostics,
            settings,
        }
    }

    /// Returns true while a refresh call is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::InFlight { .. })
    }

    /// Returns the error of the most recent refresh if it failed.
    ///
    /// Cleared by the next successful refresh.
    #[must_use]
    pub fn last_failure(&self) -> Option<NormalizedError> {
        self.last_failure.lock().clone()
    }

    /// Obtains a new access token, joining an in-flight refresh if there is one.
    ///
    /// `trace_id` is the trace id of the request that triggered the refresh;
    /// it is logged as the parent of the refresh call's own trace id.
    ///
    /// # Errors
    ///
    /// - `SESSION_EXPIRED` if the refresh failed; the tokens have been cleared
    ///   and the session listener notified.
    /// - `REFRESH_QUEUE_FULL` if too many callers are already waiting.
    /// - `REFRESH_TIMEOUT` if the in-flight refresh did not finish in time.
    pub async fn refresh(&self, trace_id: &str) -> RefreshOutcome {
        let role = {
            let mut state = self.state.lock();
            match &mut *state {
                RefreshState::InFlight { waiters } => {
                    waiters.retain(|waiter| !waiter.is_closed());
                    if waiters.len() >= self.settings.max_waiters {
                        tracing::warn!(
                            trace_id,
                            limit = self.settings.max_waiters,
                            "refresh waiter queue is full"
                        );
                        return Err(NormalizedError::refresh_queue_full(
                            self.settings.max_waiters,
                        ));
                    }
                    let (sender, receiver) = oneshot::channel();
                    waiters.push_back(sender);
                    Role::Waiter(receiver)
                }
                RefreshState::Idle => {
                    *state = RefreshState::InFlight {
                        waiters: VecDeque::new(),
                    };
                    Role::Leader
                }
            }
        };

        match role {
            Role::Leader => self.lead(trace_id).await,
            Role::Waiter(receiver) => self.wait(trace_id, receiver).await,
        }
    }

    async fn lead(&self, trace_id: &str) -> RefreshOutcome {
        let guard = LeaderGuard {
            state: &self.state,
            armed: true,
        };
        self.diagnostics.refresh_started(trace_id);

        let request = ApiRequest::post(self.settings.endpoint.clone())
            .with_context(RequestContext::anonymous());
        tracing::debug!(
            trace_id = %request.context.trace_id,
            parent_trace_id = trace_id,
            "refreshing access token"
        );

        let outcome = match self.request_new_tokens(request.clone()).await {
            Ok(pair) => {
                *self.last_failure.lock() = None;
                self.store.store_pair(&pair).await;
                tracing::info!(trace_id, "access token refreshed");
                self.diagnostics.refresh_succeeded(trace_id);
                Ok(pair.access_token)
            }
            Err(cause) => {
                let error = NormalizedError::session_expired(cause.as_ref());
                *self.last_failure.lock() = Some(error.clone());
                self.store.clear().await;
                tracing::warn!(
                    trace_id,
                    cause = cause.as_ref().map(|c| c.code.as_str()),
                    "token refresh failed; session cleared"
                );
                self.diagnostics.refresh_failed(trace_id, &error);
                Err(error)
            }
        };

        let waiters = guard.finish();
        if let Err(error) = &outcome {
            self.listener.login_required(&self.settings.login_route);
            self.diagnostics.failure(&request, error);
        }
        tracing::debug!(trace_id, waiters = waiters.len(), "releasing refresh waiters");
        for waiter in waiters {
            // A waiter that timed out has dropped its receiver.
            let _ = waiter.send(outcome.clone());
        }
        outcome
    }

    /// Performs the refresh call. `Err(None)` means there was nothing to refresh with.
    async fn request_new_tokens(
        &self,
        request: ApiRequest,
    ) -> Result<TokenPair, Option<NormalizedError>> {
        let Some(refresh_token) = self.store.refresh_token().await else {
            tracing::debug!("no refresh token stored");
            return Err(None);
        };

        let mut request = request
            .with_json(&RefreshTokenRequest { refresh_token })
            .map_err(|e| Some(NormalizedError::from(e)))?;
        self.pipeline.prepare(&mut request).await;

        let response = self
            .transport
            .send(&request, self.settings.request_timeout)
            .await
            .map_err(|e| Some(ErrorNormalizer::from_transport(&e)))?;

        if !response.is_success() {
            return Err(Some(ErrorNormalizer::from_response(&response)));
        }

        let pair: TokenPair = response
            .json()
            .map_err(|e| Some(ErrorNormalizer::from_decode(response.status, &e)))?;
        if pair.access_token.trim().is_empty() {
            return Err(Some(NormalizedError::invalid_response(
                response.status,
                "Refresh response did not contain an access token",
            )));
        }
        Ok(pair)
    }

    async fn wait(
        &self,
        trace_id: &str,
        receiver: oneshot::Receiver<RefreshOutcome>,
    ) -> RefreshOutcome {
        tracing::debug!(trace_id, "waiting for in-flight refresh");
        match tokio::time::timeout(self.settings.wait_timeout, receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(NormalizedError::session_expired(Some(
                &NormalizedError::client("Session refresh was abandoned before completing"),
            ))),
            Err(_) => {
                let timeout_ms =
                    u64::try_from(self.settings.wait_timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(trace_id, timeout_ms, "gave up waiting for refresh");
                Err(NormalizedError::refresh_timeout(timeout_ms))
            }
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Returns the coordinator to `Idle` if the leader is dropped mid-refresh.
///
/// Dropping the queued senders wakes every waiter with a closed channel.
struct LeaderGuard<'a> {
    state: &'a Mutex<RefreshState>,
    armed: bool,
}

impl LeaderGuard<'_> {
    fn finish(mut self) -> VecDeque<oneshot::Sender<RefreshOutcome>> {
        self.armed = false;
        take_waiters(self.state)
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let waiters = take_waiters(self.state);
            tracing::warn!(waiters = waiters.len(), "token refresh abandoned");
        }
    }
}

fn take_waiters(state: &Mutex<RefreshState>) -> VecDeque<oneshot::Sender<RefreshOutcome>> {
    match std::mem::replace(&mut *state.lock(), RefreshState::Idle) {
        RefreshState::InFlight { waiters } => waiters,
        RefreshState::Idle => VecDeque::new(),
    }
}
