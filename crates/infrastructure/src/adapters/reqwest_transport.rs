//! HTTP transport implementation using reqwest.
//!
//! Resolves request paths against the API base URL, encodes the query and
//! JSON body, and maps reqwest failures onto `TransportError`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use tenancy_application::ports::{HttpTransport, TransportError};
use tenancy_domain::{ApiRequest, ApiResponse, ClientConfig, HttpMethod};

/// `HttpTransport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Creates a transport for `base_url` with default client settings.
    ///
    /// Default configuration:
    /// - Follow redirects: up to 10
    /// - TLS verification: enabled
    /// - User-Agent: `tenancy/<version>`
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(base_url: Url) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("tenancy/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Creates a transport for the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidRequest` if the base URL is invalid.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let base_url = config
            .parsed_base_url()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Self::new(base_url)
    }

    /// Creates a transport with a custom reqwest client.
    ///
    /// `base_url` should end with `/`; paths are joined below it.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the absolute URL of `request`, including its query string.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidRequest` if the path or query cannot be encoded.
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let relative = request.path.trim_start_matches('/');
        let mut url = self
            .base_url
            .join(relative)
            .map_err(|e| TransportError::InvalidRequest(format!("{e}: {}", request.path)))?;

        if !request.query.is_empty() {
            let query = serde_urlencoded::to_string(&request.query)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }
        if error.is_connect() || error.is_request() {
            return TransportError::Connection(error.to_string());
        }
        if error.is_body() || error.is_decode() {
            return TransportError::Body(error.to_string());
        }
        if error.is_builder() {
            return TransportError::InvalidRequest(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        timeout: Duration,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(request)?;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(timeout)
            .header(ACCEPT, mime::APPLICATION_JSON.as_ref());

        for header in request.headers.iter() {
            builder = builder.header(&header.name, &header.value);
        }

        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| TransportError::InvalidRequest(format!("invalid JSON body: {e}")))?;
            if !request.headers.contains(CONTENT_TYPE.as_str()) {
                builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
            }
            builder = builder.body(bytes);
        }

        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?
            .to_vec();

        let duration = start.elapsed();
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "response received"
        );

        Ok(ApiResponse::new(status, headers, body, duration))
    }
}
