//! Authentication handling for JIRA API.
//!
//! JIRA accepts Basic Auth with a login and a secret. The secret is either an
//! API token or, on old self-hosted instances, the bare user password. Tokens
//! of configured profiles are kept in the OS keyring.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::error::{ApiError, Result};

/// The keyring service name for jira-client tokens.
const KEYRING_SERVICE: &str = "jira-client";

/// Credentials used for each request to the JIRA REST API.
#[derive(Clone, Default)]
pub struct Auth {
    login: String,
    secret: String,
}

impl Auth {
    /// Create credentials from a login and a secret.
    pub fn new(login: &str, secret: &str) -> Self {
        Self {
            login: login.to_string(),
            secret: secret.to_string(),
        }
    }

    /// The user login.
    pub fn login(&self) -> &str {
        &self.login
    }

    /// The authentication secret.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Get the authorization header value for HTTP requests.
    pub fn header_value(&self) -> String {
        build_auth_header(&self.login, &self.secret)
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("login", &self.login)
            .field("secret", &"<hidden>")
            .finish()
    }
}

/// Build the Basic Auth header value.
fn build_auth_header(login: &str, secret: &str) -> String {
    let credentials = format!("{}:{}", login, secret);
    format!("Basic {}", BASE64.encode(credentials.as_bytes()))
}

/// Store an API token in the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be stored in the keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to create keyring entry: {}", e)))?;

    entry
        .set_password(token)
        .map_err(|e| ApiError::Keyring(format!("failed to store token: {}", e)))
}

/// Retrieve an API token from the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be retrieved from the keyring.
pub fn get_token(profile_name: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .get_password()
        .map_err(|e| ApiError::Keyring(format!("failed to retrieve token: {}", e)))
}

/// Delete an API token from the OS keyring.
pub fn delete_token(profile_name: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .delete_password()
        .map_err(|e| ApiError::Keyring(format!("failed to delete token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_auth_header() {
        let header = build_auth_header("test_user", "test_token");
        assert_eq!(header, "Basic dGVzdF91c2VyOnRlc3RfdG9rZW4=");
    }

    #[test]
    fn test_auth_accessors() {
        let auth = Auth::new("jdoe", "secret_token");
        assert_eq!(auth.login(), "jdoe");
        assert_eq!(auth.secret(), "secret_token");
    }

    #[test]
    fn test_auth_header_value_decodes() {
        let auth = Auth::new("user@example.com", "api_token_here");
        let header = auth.header_value();

        let encoded = header.strip_prefix("Basic ").unwrap();
        let decoded = String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();
        assert_eq!(decoded, "user@example.com:api_token_here");
    }

    #[test]
    fn test_auth_does_not_expose_secret() {
        let auth = Auth::new("user@example.com", "secret_token");
        let debug_output = format!("{:?}", auth);

        assert!(debug_output.contains("user@example.com"));
        assert!(!debug_output.contains("secret_token"));
    }
}
