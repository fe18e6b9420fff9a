//! HTTP transport used by the raw client.
//!
//! The raw client never talks to `reqwest` directly: it builds a
//! [`TransportRequest`] and hands it to an [`HttpTransport`]. The default
//! implementation is [`ReqwestTransport`]; tests and embedding applications can
//! inject their own.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, multipart, Client};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use super::auth::Auth;
use super::error::{ApiError, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
    /// POST with a multipart encoded body.
    Multipart,
}

impl RequestMethod {
    /// Name used in logs and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Multipart => "MULTIPART",
        }
    }

    /// Check if the arguments of this method travel in the query string.
    pub fn uses_query(&self) -> bool {
        matches!(self, RequestMethod::Get | RequestMethod::Delete)
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file to upload in a multipart request.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    /// Form field name.
    pub field: String,
    /// Local path of the file.
    pub path: PathBuf,
    /// File name reported to JIRA.
    pub file_name: String,
    /// MIME type of the content.
    pub mime: String,
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FilePart>),
}

/// A fully prepared request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: RequestMethod,
    pub url: String,
    pub login: String,
    pub secret: String,
    pub payload: Payload,
}

/// What came back from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

/// Sends requests to the JIRA server.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return the raw response.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;

    /// Change the timeout applied to each request.
    fn set_timeout(&mut self, timeout: Duration);
}

/// Default transport built on `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a transport with an explicit timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().build().map_err(ApiError::Network)?;
        Ok(Self { client, timeout })
    }

    /// Current request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn build_form(parts: &[FilePart]) -> Result<multipart::Form> {
        let mut form = multipart::Form::new();
        for part in parts {
            let data = tokio::fs::read(&part.path).await?;
            trace!("Attaching {} ({} bytes)", part.file_name, data.len());
            let file = multipart::Part::bytes(data)
                .file_name(part.file_name.clone())
                .mime_str(&part.mime)?;
            form = form.part(part.field.clone(), file);
        }
        Ok(form)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let auth = Auth::new(&request.login, &request.secret);

        let mut builder = match request.method {
            RequestMethod::Get => self.client.get(&request.url),
            RequestMethod::Post | RequestMethod::Multipart => self.client.post(&request.url),
            RequestMethod::Put => self.client.put(&request.url),
            RequestMethod::Delete => self.client.delete(&request.url),
        };

        builder = builder
            .timeout(self.timeout)
            .header(header::AUTHORIZATION, auth.header_value())
            .header(header::ACCEPT, "application/json");

        builder = match (&request.method, &request.payload) {
            (RequestMethod::Multipart, Payload::Multipart(parts)) => {
                let form = Self::build_form(parts).await?;
                builder.header("X-Atlassian-Token", "no-check").multipart(form)
            }
            (RequestMethod::Post | RequestMethod::Put, Payload::Json(body)) => builder.json(body),
            _ => builder.header(header::CONTENT_TYPE, "application/json"),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    url: request.url.clone(),
                    seconds: self.timeout.as_secs(),
                }
            } else {
                ApiError::Network(e)
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;

        debug!("Jira answered {} ({})", status, content_type);
        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}
