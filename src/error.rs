//! Centralized error types for jira-client.
//!
//! The REST layer reports [`ApiError`]s; domain wrappers add their own error
//! kinds on top. All error types use `thiserror`.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// The main error type of the domain layer.
#[derive(Debug, Error)]
pub enum Error {
    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// IO errors (file system, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Issue(String),

    #[error("{0}")]
    Component(String),

    #[error("{0}")]
    Version(String),

    #[error("{0}")]
    User(String),

    #[error("{0}")]
    Link(String),

    #[error("{0}")]
    CustomField(String),

    #[error("{0}")]
    Attachment(String),

    #[error("{0}")]
    Group(String),

    /// The requested transition is not available for the issue.
    #[error("{0}")]
    Transition(String),

    /// A date value could not be parsed.
    #[error("{0}")]
    Date(String),
}

impl Error {
    pub fn issue(msg: impl Into<String>) -> Self {
        Error::Issue(msg.into())
    }

    pub fn component(msg: impl Into<String>) -> Self {
        Error::Component(msg.into())
    }

    pub fn version(msg: impl Into<String>) -> Self {
        Error::Version(msg.into())
    }

    pub fn user(msg: impl Into<String>) -> Self {
        Error::User(msg.into())
    }

    pub fn link(msg: impl Into<String>) -> Self {
        Error::Link(msg.into())
    }

    pub fn custom_field(msg: impl Into<String>) -> Self {
        Error::CustomField(msg.into())
    }

    pub fn attachment(msg: impl Into<String>) -> Self {
        Error::Attachment(msg.into())
    }

    pub fn group(msg: impl Into<String>) -> Self {
        Error::Group(msg.into())
    }

    pub fn transition(msg: impl Into<String>) -> Self {
        Error::Transition(msg.into())
    }

    pub fn date(msg: impl Into<String>) -> Self {
        Error::Date(msg.into())
    }

    /// The REST error behind this error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Check if JIRA reported that the requested object does not exist.
    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_found)
    }

    /// Check if this error is recoverable.
    ///
    /// Recoverable errors may go away when the call is repeated later.
    pub fn is_recoverable(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_retryable)
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_config_error() {
        let err: Error = ConfigError::NoConfigDir.into();
        assert!(matches!(err, Error::Config(ConfigError::NoConfigDir)));
    }

    #[test]
    fn test_error_from_api_error() {
        let err: Error = ApiError::api(404, "Issue does not exist", None).into();
        assert!(err.is_not_found());
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Issue does not exist");
    }

    #[test]
    fn test_recoverable_server_error() {
        let err: Error = ApiError::api(503, "maintenance", None).into();
        assert!(err.is_recoverable());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_domain_errors_keep_message() {
        let err = Error::transition("Transition 'Done' is not available");
        assert!(matches!(err, Error::Transition(_)));
        assert_eq!(err.to_string(), "Transition 'Done' is not available");
        assert!(!err.is_recoverable());
        assert!(err.api_error().is_none());
    }
}
