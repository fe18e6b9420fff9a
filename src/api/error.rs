//! API error types for the JIRA REST layer.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the JIRA REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// JIRA answered with an error.
    ///
    /// `response` holds the decoded error body when JIRA sent JSON.
    #[error("{message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Human readable description built from the response.
        message: String,
        /// The decoded API response, if any.
        response: Option<Value>,
    },

    /// Authorization failed or access was forbidden (HTML answer from JIRA).
    #[error("{0}")]
    Authorization(String),

    /// The response claimed to be JSON but could not be parsed.
    #[error("Jira REST API interaction error, failed to parse JSON: {0}")]
    InvalidResponse(String),

    /// The response body is not JSON and raw mode was not requested.
    #[error(
        "Jira REST API responded with non-JSON data. Use the raw request variant if you want to get the result as a string"
    )]
    NonJson,

    /// The request did not finish in time.
    #[error("Request to '{url}' timed out after {seconds} seconds")]
    Timeout {
        /// The requested URL.
        url: String,
        /// Configured timeout.
        seconds: u64,
    },

    /// Network or HTTP error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Keyring error when storing/retrieving tokens.
    #[error("Keyring error: {0}")]
    Keyring(String),

    /// Local file access failed (attachments upload).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request arguments could not be serialized.
    #[error("Failed to serialize request: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create a generic API error for a status code.
    pub fn api(status: u16, message: impl Into<String>, response: Option<Value>) -> Self {
        ApiError::Api {
            status,
            message: message.into(),
            response,
        }
    }

    /// HTTP status code associated with the error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The decoded JSON body JIRA answered with.
    pub fn api_response(&self) -> Option<&Value> {
        match self {
            ApiError::Api { response, .. } => response.as_ref(),
            _ => None,
        }
    }

    /// Check if the error means the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if the request may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout { .. } => true,
            ApiError::Api { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}
