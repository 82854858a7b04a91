//! HTTP client for the Scrapi backend
//!
//! Every call returns an [`ApiResponse`] regardless of status code: the
//! suites assert on 401/404 as often as on 200/201, so only transport
//! failures surface as [`ClientError`].

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ErrorCategory;
use crate::models::{CreateRunRequest, LoginRequest, NewActor, RegisterRequest};

// ============================================================================
// Client Errors
// ============================================================================

/// Errors raised before a response could be read
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The underlying HTTP client could not be built
    #[error("Initialization error: {0}")]
    Init(String),

    /// Connect, TLS, timeout or body-read failure
    #[error("Network error: {0}")]
    Network(String),

    /// The body was not the JSON shape the caller asked for
    #[error("Failed to decode response ({status}): {message}")]
    Decode { status: u16, message: String },
}

impl ClientError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Init(_) => ErrorCategory::Config,
            Self::Network(_) => ErrorCategory::Network,
            Self::Decode { .. } => ErrorCategory::Protocol,
        }
    }
}

// ============================================================================
// API Response
// ============================================================================

/// Status and body of a completed request
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,

    /// Raw response body
    pub body: String,

    /// Fully qualified URL that was requested
    pub url: String,
}

impl ApiResponse {
    pub fn is_status(&self, code: u16) -> bool {
        self.status == code
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_str(&self.body).map_err(|e| ClientError::Decode {
            status: self.status,
            message: e.to_string(),
        })
    }

    /// Decode the body as untyped JSON, if it is JSON at all
    pub fn value(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Body for failure details: parsed JSON when possible, raw text otherwise
    pub fn details(&self) -> Value {
        self.value()
            .unwrap_or_else(|| Value::String(self.body.clone()))
    }
}

// ============================================================================
// API Client
// ============================================================================

/// Client bound to one backend deployment, optionally holding a bearer token
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client from configuration
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        Self::build(
            config.base_url(),
            config.request_timeout(),
            config.backend.accept_invalid_certs,
            &config.backend.user_agent,
        )
    }

    /// Create a client against an explicit base URL, mainly for mock servers
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        Self::build(
            base_url.trim_end_matches('/'),
            timeout,
            false,
            concat!("scrapi-probe/", env!("CARGO_PKG_VERSION")),
        )
    }

    fn build(
        base_url: &str,
        timeout: Duration,
        accept_invalid_certs: bool,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent)
            .default_headers(headers)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Drop the token, returning it so the caller can restore it later
    pub fn take_token(&mut self) -> Option<String> {
        self.token.take()
    }

    /// Send a request and return whatever the server answered
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse, ClientError> {
        let url = format!("{}{}", self.base_url, endpoint);
        info!(method = %method, url = %url, "Making request");

        let mut request = self.http_client.request(method.clone(), &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(method = %method, url = %url, error = %e, "Request error");
            ClientError::Network(e.to_string())
        })?;

        let status = response.status().as_u16();
        info!(status, "Response status");

        let body = response.text().await.map_err(|e| {
            warn!(url = %url, error = %e, "Failed to read response body");
            ClientError::Network(e.to_string())
        })?;
        debug!(bytes = body.len(), "Response body read");

        Ok(ApiResponse { status, body, url })
    }

    pub async fn get(&self, endpoint: &str) -> Result<ApiResponse, ClientError> {
        self.send::<()>(Method::GET, endpoint, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse, ClientError> {
        self.send(Method::POST, endpoint, Some(body)).await
    }

    // ------------------------------------------------------------------
    // Endpoint helpers
    // ------------------------------------------------------------------

    /// `POST /auth/register`
    pub async fn register(&self, request: &RegisterRequest) -> Result<ApiResponse, ClientError> {
        self.post("/auth/register", request).await
    }

    /// `POST /auth/login`
    pub async fn login(&self, request: &LoginRequest) -> Result<ApiResponse, ClientError> {
        self.post("/auth/login", request).await
    }

    /// `GET /auth/me`
    pub async fn me(&self) -> Result<ApiResponse, ClientError> {
        self.get("/auth/me").await
    }

    /// `GET /actors` (public store listing)
    pub async fn list_actors(&self) -> Result<ApiResponse, ClientError> {
        self.get("/actors").await
    }

    /// `GET /actors?myActors=true`
    pub async fn list_my_actors(&self) -> Result<ApiResponse, ClientError> {
        self.get("/actors?myActors=true").await
    }

    /// `GET /actors/{actorId}`
    pub async fn get_actor(&self, actor_id: &str) -> Result<ApiResponse, ClientError> {
        self.get(&format!("/actors/{actor_id}")).await
    }

    /// `POST /actors`
    pub async fn create_actor(&self, actor: &NewActor) -> Result<ApiResponse, ClientError> {
        self.post("/actors", actor).await
    }

    /// `GET /runs`
    pub async fn list_runs(&self) -> Result<ApiResponse, ClientError> {
        self.get("/runs").await
    }

    /// `GET /runs/{runId}`
    pub async fn get_run(&self, run_id: &str) -> Result<ApiResponse, ClientError> {
        self.get(&format!("/runs/{run_id}")).await
    }

    /// `POST /runs`
    pub async fn create_run(&self, request: &CreateRunRequest) -> Result<ApiResponse, ClientError> {
        self.post("/runs", request).await
    }
}

// ============================================================================
// Tests
// ============================================================================
