//! Test doubles shared by the unit tests of this crate.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tenancy_domain::{ApiRequest, ApiResponse, ClientConfig, request::AUTHORIZATION};

use crate::auth::MemoryTokenStorage;
use crate::client::{ApiClient, ClientDependencies};
use crate::ports::{
    Breadcrumb, Clock, DiagnosticsSink, ErrorReport, HttpTransport, SessionListener,
    TransportError,
};

/// Fixed "now" used by token tests: 2026-01-01T00:00:00Z.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

/// Builds an unsigned JWT whose `exp` is `now + seconds`.
pub fn jwt_expiring_in(seconds: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = serde_json::json!({"sub": "u-1", "exp": epoch().timestamp() + seconds});
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}

pub fn json_response(status: u16, body: Value) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse::json_body(status, &body))
}

/// Clock pinned to a settable instant.
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, seconds: i64) {
        let mut now = self.0.lock();
        *now += chrono::Duration::seconds(seconds);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

type Handler = dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

/// Transport answering from a closure and recording every request sent.
pub struct MockTransport {
    handler: Box<Handler>,
    delays: HashMap<String, Duration>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delays: HashMap::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Delays every response to `path`.
    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.sent.lock().iter().filter(|r| r.path == path).count()
    }

    /// Authorization headers sent to `path`, in order.
    pub fn auth_headers_for(&self, path: &str) -> Vec<Option<String>> {
        self.sent
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .map(|r| r.headers.get(AUTHORIZATION).map(String::from))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        _timeout: Duration,
    ) -> Result<ApiResponse, TransportError> {
        self.sent.lock().push(request.clone());
        if let Some(delay) = self.delays.get(&request.path) {
            tokio::time::sleep(*delay).await;
        }
        (self.handler)(request)
    }
}

#[derive(Default)]
pub struct RecordingDiagnostics {
    pub breadcrumbs: Mutex<Vec<Breadcrumb>>,
    pub reports: Mutex<Vec<ErrorReport>>,
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn breadcrumb(&self, crumb: Breadcrumb) {
        self.breadcrumbs.lock().push(crumb);
    }

    fn report(&self, report: ErrorReport) {
        self.reports.lock().push(report);
    }
}

#[derive(Default)]
pub struct RecordingListener {
    pub redirects: Mutex<Vec<String>>,
}

impl SessionListener for RecordingListener {
    fn login_required(&self, redirect_to: &str) {
        self.redirects.lock().push(redirect_to.to_string());
    }
}

/// A client wired to doubles, plus handles to inspect them.
pub struct Harness {
    pub client: Arc<ApiClient>,
    pub transport: Arc<MockTransport>,
    pub storage: Arc<MemoryTokenStorage>,
    pub diagnostics: Arc<RecordingDiagnostics>,
    pub listener: Arc<RecordingListener>,
}

impl Harness {
    pub fn new(config: ClientConfig, transport: MockTransport) -> Self {
        let transport = Arc::new(transport);
        let storage = Arc::new(MemoryTokenStorage::new());
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let listener = Arc::new(RecordingListener::default());
        let client = ApiClient::new(
            config,
            ClientDependencies {
                transport: transport.clone(),
                storage: storage.clone(),
                clock: Arc::new(FixedClock::at(epoch())),
                diagnostics: diagnostics.clone(),
                session_listener: listener.clone(),
            },
        )
        .unwrap();

        Self {
            client: Arc::new(client),
            transport,
            storage,
            diagnostics,
            listener,
        }
    }
}
