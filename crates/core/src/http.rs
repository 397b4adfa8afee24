//! Reqwest-backed HTTP client adapter.
//!
//! The adapter owns transport concerns only: base URL joining, the bearer
//! header, the request timeout, and mapping failures into [`NetworkError`].
//! It never retries; callers decide how to degrade.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{config::AppConfig, error::NetworkError, session::Session};

const BODY_PREVIEW_CHARS: usize = 160;

/// Query parameters and JSON body attached to a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters; pairs with an empty value are dropped.
    pub params: Vec<(String, String)>,
    /// JSON request body.
    pub body: Option<Value>,
}

impl RequestOptions {
    /// Options with neither query nor body.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a query parameter, skipping absent or blank values.
    pub fn param(mut self, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.trim().is_empty() {
                self.params.push((key.to_string(), value));
            }
        }
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Successful (2xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Status code.
    pub status: u16,
    /// Raw body text.
    pub body: String,
}

impl ApiResponse {
    /// Body parsed as JSON; an empty body decodes to `null`.
    pub fn json(&self) -> serde_json::Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&self.body)
    }
}

/// HTTP adapter bound to one API base URL and one session.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl HttpClient {
    /// Build an adapter with an explicit timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration, session: Session) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Build an adapter from resolved configuration.
    pub fn from_config(config: &AppConfig, session: Session) -> Result<Self> {
        Self::new(config.api_url.clone(), config.timeout(), session)
    }

    /// Session whose token is attached to outgoing requests.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request and map every failure into a [`NetworkError`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, NetworkError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        if !options.params.is_empty() {
            builder = builder.query(&options.params);
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        debug!(%method, path, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|err| log_failure(&method, path, map_transport_error(err)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| log_failure(&method, path, map_transport_error(err)))?;
        if !status.is_success() {
            return Err(log_failure(&method, path, map_status_error(status, body)));
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }

    /// GET shorthand.
    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, NetworkError> {
        self.request(Method::GET, path, options).await
    }

    /// POST shorthand.
    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, NetworkError> {
        self.request(Method::POST, path, options).await
    }
}

fn map_transport_error(err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::no_response(format!("request timed out: {err}"))
    } else {
        NetworkError::no_response(err.to_string())
    }
}

fn map_status_error(status: StatusCode, body: String) -> NetworkError {
    NetworkError::HttpStatus {
        status: status.as_u16(),
        body,
    }
}

fn log_failure(method: &Method, path: &str, err: NetworkError) -> NetworkError {
    match &err {
        NetworkError::NoResponse { reason } => {
            error!(%method, path, reason = %reason, "API request failed");
            error!("No response from the server. Check that the backend is running.");
        }
        NetworkError::HttpStatus { status, body } => {
            warn!(%method, path, status, body = %body_preview(body), "API request failed");
        }
    }
    err
}

fn body_preview(body: &str) -> String {
    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let preview = compact.chars().take(BODY_PREVIEW_CHARS).collect::<String>();
    if compact.chars().count() > BODY_PREVIEW_CHARS {
        format!("{preview}...")
    } else {
        preview
    }
}
