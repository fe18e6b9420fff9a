//! Raw client for the JIRA REST API.
//!
//! Provides the most direct access to the API: builds the request URL, sends
//! one request through the configured [`HttpTransport`], decodes the JSON answer
//! and turns JIRA error responses into [`ApiError`]s. Successful GET responses
//! can be memoized through a [`ResponseCache`].

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::{debug, instrument, trace, warn};

use super::auth::Auth;
use super::error::{ApiError, Result};
use super::transport::{
    FilePart, HttpTransport, Payload, ReqwestTransport, RequestMethod, TransportRequest,
    TransportResponse, DEFAULT_TIMEOUT_SECS,
};
use crate::cache::{hash_key, NullCache, ResponseCache};

/// JIRA URL used when nothing else is configured.
pub const DEFAULT_JIRA_URL: &str = "https://jira.localhost/";

/// API prefix used when nothing else is configured.
pub const DEFAULT_API_PREFIX: &str = "/rest/api/latest/";

/// Base delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Status codes JIRA uses for successful calls.
const SUCCESS_CODES: [u16; 3] = [200, 201, 204];

/// Decoded answer of a single call.
enum Reply {
    Json(Value),
    Raw(String),
}

/// Raw client to the JIRA REST API.
pub struct RawClient {
    jira_url: String,
    api_prefix: String,
    auth: RwLock<Auth>,
    timeout: Duration,
    max_retries: u32,
    transport: Box<dyn HttpTransport>,
    cache: Arc<dyn ResponseCache>,
}

impl std::fmt::Debug for RawClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawClient")
            .field("jira_url", &self.jira_url)
            .field("api_prefix", &self.api_prefix)
            .field("login", &self.login())
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl RawClient {
    /// Create a client for a JIRA instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the default HTTP transport cannot be built.
    pub fn new(jira_url: &str, api_prefix: &str) -> Result<Self> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(jira_url, api_prefix, Box::new(transport)))
    }

    /// Create a client that sends requests through `transport`.
    pub fn with_transport(
        jira_url: &str,
        api_prefix: &str,
        transport: Box<dyn HttpTransport>,
    ) -> Self {
        Self {
            jira_url: normalize_jira_url(jira_url),
            api_prefix: normalize_api_prefix(api_prefix),
            auth: RwLock::new(Auth::default()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
            transport,
            cache: Arc::new(NullCache),
        }
    }

    /// Set credentials to use in each request.
    ///
    /// `secret` is an API token or, on old servers, the bare user password.
    pub fn set_auth(&self, login: &str, secret: &str) {
        if let Ok(mut auth) = self.auth.write() {
            *auth = Auth::new(login, secret);
        }
    }

    /// Login used for requests.
    pub fn login(&self) -> String {
        self.auth
            .read()
            .map(|a| a.login().to_string())
            .unwrap_or_default()
    }

    fn credentials(&self) -> (String, String) {
        self.auth
            .read()
            .map(|a| (a.login().to_string(), a.secret().to_string()))
            .unwrap_or_default()
    }

    /// URL of the JIRA web UI root. Always ends with `/`.
    pub fn jira_url(&self) -> &str {
        &self.jira_url
    }

    pub fn set_jira_url(&mut self, url: &str) {
        self.jira_url = normalize_jira_url(url);
    }

    /// Path of the API root relative to the JIRA URL, e.g. `rest/api/latest/`.
    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub fn set_api_prefix(&mut self, prefix: &str) {
        self.api_prefix = normalize_api_prefix(prefix);
    }

    pub fn request_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
        self.transport.set_timeout(timeout);
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Number of extra attempts for transient failures (0 disables retries).
    pub fn set_max_retries(&mut self, retries: u32) {
        self.max_retries = retries;
    }

    /// Replace the HTTP transport.
    pub fn set_transport(&mut self, mut transport: Box<dyn HttpTransport>) {
        transport.set_timeout(self.timeout);
        self.transport = transport;
    }

    /// Cache used for GET responses.
    pub fn cache(&self) -> Arc<dyn ResponseCache> {
        Arc::clone(&self.cache)
    }

    pub fn set_cache(&mut self, cache: Arc<dyn ResponseCache>) {
        self.cache = cache;
    }

    /// GET request with arguments in the query string.
    pub async fn get(&self, api_method: &str, arguments: &Value) -> Result<Value> {
        let reply = self
            .request(RequestMethod::Get, api_method, arguments.clone(), false)
            .await?;
        Ok(reply_json(reply))
    }

    /// GET request returning the response body as is.
    pub async fn get_raw(&self, api_method: &str, arguments: &Value) -> Result<String> {
        let reply = self
            .request(RequestMethod::Get, api_method, arguments.clone(), true)
            .await?;
        Ok(reply_raw(reply))
    }

    /// POST request with a JSON body.
    pub async fn post(&self, api_method: &str, arguments: Value) -> Result<Value> {
        let reply = self
            .request(RequestMethod::Post, api_method, arguments, false)
            .await?;
        Ok(reply_json(reply))
    }

    /// PUT request with a JSON body.
    pub async fn put(&self, api_method: &str, arguments: Value) -> Result<Value> {
        let reply = self
            .request(RequestMethod::Put, api_method, arguments, false)
            .await?;
        Ok(reply_json(reply))
    }

    /// DELETE request with arguments in the query string.
    pub async fn delete(&self, api_method: &str, arguments: &Value) -> Result<Value> {
        let reply = self
            .request(RequestMethod::Delete, api_method, arguments.clone(), false)
            .await?;
        Ok(reply_json(reply))
    }

    /// POST request with a multipart body.
    pub async fn multipart(&self, api_method: &str, files: Vec<FilePart>) -> Result<Value> {
        let url = self.build_url(RequestMethod::Multipart, api_method, &Value::Null);
        let reply = self
            .execute(RequestMethod::Multipart, url, Payload::Multipart(files), false)
            .await?;
        Ok(reply_json(reply))
    }

    /// Build the full URL for an API method.
    fn build_url(&self, method: RequestMethod, api_method: &str, arguments: &Value) -> String {
        let mut url = format!(
            "{}{}{}",
            self.jira_url,
            self.api_prefix,
            api_method.trim_start_matches('/')
        );

        if method.uses_query() {
            let query = build_query(arguments);
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query);
            }
        }
        url
    }

    async fn request(
        &self,
        method: RequestMethod,
        api_method: &str,
        arguments: Value,
        raw: bool,
    ) -> Result<Reply> {
        let url = self.build_url(method, api_method, &arguments);
        let payload = if method.uses_query() || arguments.is_null() {
            Payload::Empty
        } else {
            Payload::Json(arguments)
        };
        self.execute(method, url, payload, raw).await
    }

    #[instrument(skip_all, fields(method = %method))]
    async fn execute(
        &self,
        method: RequestMethod,
        url: String,
        payload: Payload,
        raw: bool,
    ) -> Result<Reply> {
        let cache_key = (method == RequestMethod::Get)
            .then(|| hash_key(&format!("{}{}", method.as_str(), url)));

        debug!("Method \"{} {}\" requested.", method, url);

        let cached = cache_key
            .as_deref()
            .and_then(|key| self.cache.get(key))
            .and_then(|record| cached_response(&record));

        let (response, is_success) = match cached {
            Some(response) => {
                debug!("Using cached response.");
                (response, true)
            }
            None => {
                debug!("Sending request to Jira API...");
                let (login, secret) = self.credentials();
                let request = TransportRequest {
                    method,
                    url,
                    login,
                    secret,
                    payload,
                };
                let response = self.send_with_retries(request).await?;
                let is_success = SUCCESS_CODES.contains(&response.status);

                if let (Some(key), true) = (&cache_key, is_success) {
                    let record = json!({
                        "body": response.body,
                        "content_type": response.content_type,
                        "http_code": response.status,
                    });
                    if let Err(e) = self.cache.set(key, record) {
                        warn!("Failed to cache response: {}", e);
                    } else {
                        trace!("Stored response under {}", key);
                    }
                }
                (response, is_success)
            }
        };

        interpret_response(response, is_success, raw)
    }

    /// Send a request, repeating it on transient failures.
    async fn send_with_retries(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self.transport.send(request.clone()).await;

            let retryable = match &result {
                Ok(response) => is_retryable_status(response.status),
                Err(e) => e.is_retryable(),
            };

            if !retryable || attempt > self.max_retries {
                return result;
            }

            let delay = calculate_retry_delay(attempt);
            match &result {
                Ok(response) => warn!(
                    "Jira answered {} (attempt {}), retrying in {}ms",
                    response.status, attempt, delay
                ),
                Err(e) => warn!("Request failed (attempt {}), retrying in {}ms: {}", attempt, delay, e),
            }
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

fn reply_json(reply: Reply) -> Value {
    match reply {
        Reply::Json(value) => value,
        Reply::Raw(body) => Value::String(body),
    }
}

fn reply_raw(reply: Reply) -> String {
    match reply {
        Reply::Raw(body) => body,
        Reply::Json(Value::Null) => String::new(),
        Reply::Json(value) => value.to_string(),
    }
}

/// Rebuild a response from a cache record.
fn cached_response(record: &Value) -> Option<TransportResponse> {
    Some(TransportResponse {
        body: record.get("body")?.as_str()?.to_string(),
        content_type: record.get("content_type")?.as_str()?.to_string(),
        status: u16::try_from(record.get("http_code")?.as_u64()?).ok()?,
    })
}

/// Turn a response into a decoded reply or an error.
fn interpret_response(response: TransportResponse, is_success: bool, raw: bool) -> Result<Reply> {
    let TransportResponse {
        status,
        content_type,
        body,
    } = response;

    if is_success && body.is_empty() {
        return Ok(if raw {
            Reply::Raw(body)
        } else {
            Reply::Json(Value::Null)
        });
    }

    let parsed = serde_json::from_str::<Value>(&body);
    let is_json = content_type.starts_with("application/json");

    if let (true, Err(e)) = (is_json, &parsed) {
        return Err(ApiError::InvalidResponse(format!(
            "{}. Raw API response: {:?}",
            e, body
        )));
    }

    check_api_error(status, &content_type, &body, parsed.as_ref().ok())?;

    if raw {
        return Ok(Reply::Raw(body));
    }

    parsed.map(Reply::Json).map_err(|_| ApiError::NonJson)
}

/// Map JIRA error answers to errors.
fn check_api_error(
    status: u16,
    content_type: &str,
    body: &str,
    response: Option<&Value>,
) -> Result<()> {
    let is_html = content_type.starts_with("text/html");
    let is_json = content_type.starts_with("application/json");

    if status == 401 && is_html {
        return Err(ApiError::Authorization(
            "Jira API authorization failed, please check credentials".to_string(),
        ));
    }

    if status == 403 && is_html {
        return Err(ApiError::Authorization(
            "Access to the API method is forbidden. You either have not enough privileges or the captcha shown to your user"
                .to_string(),
        ));
    }

    if status >= 400 && !is_json {
        debug!("Error response body: {}", body);
        return Err(ApiError::api(
            status,
            format!(
                "Jira REST API responded with code {} and content type {}. API answer: {:?}",
                status, content_type, body
            ),
            None,
        ));
    }

    if !is_json {
        return Ok(());
    }

    let Some(response) = response else {
        return Ok(());
    };

    let error_messages = string_list(response.get("errorMessages"));
    if !error_messages.is_empty() {
        debug!("Error response body: {}", body);
        return Err(ApiError::api(
            status,
            format!("Jira REST API call error: {}", error_messages.join("; ")),
            Some(response.clone()),
        ));
    }

    if status >= 400 {
        debug!("Error response body: {}", body);
        return Err(ApiError::api(
            status,
            render_error_message(response),
            Some(response.clone()),
        ));
    }

    Ok(())
}

/// Human readable text of a JIRA error object.
fn render_error_message(response: &Value) -> String {
    if let Some(message) = response.get("message").and_then(Value::as_str) {
        if !message.is_empty() {
            return format!("Jira REST API returned an error: {}", message);
        }
    }

    let mut errors = string_list(response.get("errorMessages"));
    errors.extend(string_list(response.get("errors")));

    format!("Jira REST API returned an error:\n\t{}", errors.join("\n\t"))
}

/// Collect the string values of an array or object.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let render = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    match value {
        Some(Value::Array(items)) => items.iter().map(render).collect(),
        Some(Value::Object(map)) => map.values().map(render).collect(),
        _ => Vec::new(),
    }
}

/// URL-encode request arguments.
///
/// Arrays are joined with commas, `null` values are skipped.
pub fn build_query(arguments: &Value) -> String {
    let Some(map) = arguments.as_object() else {
        return String::new();
    };

    query_pairs(map)
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(&k), urlencoding::encode(&v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn query_pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    let scalar = |v: &Value| match v {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    };

    map.iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Array(items) => Some(
                    items
                        .iter()
                        .filter_map(scalar)
                        .collect::<Vec<_>>()
                        .join(","),
                ),
                other => scalar(other),
            };
            rendered.map(|v| (key.clone(), v))
        })
        .collect()
}

/// Force the JIRA URL to end with exactly one `/`.
fn normalize_jira_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    format!("{}/", url)
}

/// Strip leading slashes and force exactly one trailing `/`.
fn normalize_api_prefix(prefix: &str) -> String {
    format!("{}/", prefix.trim_matches('/'))
}

fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Calculate retry delay with exponential backoff.
fn calculate_retry_delay(attempt: u32) -> u64 {
    RETRY_DELAY_MS * 2u64.pow(attempt.saturating_sub(1))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport answering from a queue and remembering what was sent.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingTransport {
        pub requests: Arc<Mutex<Vec<TransportRequest>>>,
        responses: Arc<Mutex<VecDeque<TransportResponse>>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, status: u16, content_type: &str, body: &str) {
            self.responses.lock().unwrap().push_back(TransportResponse {
                status,
                content_type: content_type.to_string(),
                body: body.to_string(),
            });
        }

        pub fn push_json(&self, status: u16, body: Value) {
            self.push(status, "application/json;charset=UTF-8", &body.to_string());
        }

        pub fn sent(&self) -> Vec<TransportRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ApiError::InvalidUrl("no response queued".to_string()))
        }

        fn set_timeout(&mut self, _timeout: Duration) {}
    }

    fn raw_client(transport: &RecordingTransport) -> RawClient {
        RawClient::with_transport(
            DEFAULT_JIRA_URL,
            DEFAULT_API_PREFIX,
            Box::new(transport.clone()),
        )
    }

    #[test]
    fn test_normalize_jira_url() {
        assert_eq!(
            normalize_jira_url("https://company.atlassian.net"),
            "https://company.atlassian.net/"
        );
        assert_eq!(
            normalize_jira_url("https://company.atlassian.net///"),
            "https://company.atlassian.net/"
        );
        assert_eq!(
            normalize_jira_url("https://company.atlassian.net/jira/"),
            "https://company.atlassian.net/jira/"
        );
    }

    #[test]
    fn test_normalize_api_prefix() {
        assert_eq!(normalize_api_prefix("/rest/api/latest/"), "rest/api/latest/");
        assert_eq!(normalize_api_prefix("rest/api/2"), "rest/api/2/");
        assert_eq!(normalize_api_prefix("//rest/api/2//"), "rest/api/2/");
    }

    #[test]
    fn test_build_query() {
        let args = json!({
            "username": "john doe",
            "startAt": 0,
            "includeActive": "true",
            "fields": ["summary", "status"],
            "skipped": null,
        });
        let query = build_query(&args);
        assert!(query.contains("username=john%20doe"));
        assert!(query.contains("startAt=0"));
        assert!(query.contains("includeActive=true"));
        assert!(query.contains("fields=summary%2Cstatus"));
        assert!(!query.contains("skipped"));
        assert_eq!(build_query(&Value::Null), "");
    }

    #[test]
    fn test_retry_delay_exponential() {
        assert_eq!(calculate_retry_delay(1), 1000);
        assert_eq!(calculate_retry_delay(2), 2000);
        assert_eq!(calculate_retry_delay(3), 4000);
    }

    #[test]
    fn test_defaults() {
        let transport = RecordingTransport::new();
        let client = raw_client(&transport);
        assert_eq!(client.jira_url(), "https://jira.localhost/");
        assert_eq!(client.api_prefix(), "rest/api/latest/");
        assert_eq!(client.request_timeout(), Duration::from_secs(60));
        assert_eq!(client.max_retries(), 0);
        assert_eq!(client.login(), "");
    }

    #[tokio::test]
    async fn test_post_is_not_cached() {
        let transport = RecordingTransport::new();
        transport.push_json(200, json!({"foo": "bar"}));
        let mut client = raw_client(&transport);
        let cache = Arc::new(MemoryCache::new());
        client.set_cache(cache.clone());

        let result = client.post("/foo", Value::Null).await.unwrap();
        assert_eq!(result, json!({"foo": "bar"}));

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, RequestMethod::Post);
        assert_eq!(sent[0].url, "https://jira.localhost/rest/api/latest/foo");
        assert_eq!(sent[0].payload, Payload::Empty);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_get_uses_cache() {
        let transport = RecordingTransport::new();
        transport.push(200, "application/json", r#"{"foo":"bar"}"#);
        let mut client = raw_client(&transport);
        let cache = Arc::new(MemoryCache::new());
        client.set_cache(cache.clone());

        let first = client.get("/foo", &Value::Null).await.unwrap();
        let second = client.get("/foo", &Value::Null).await.unwrap();

        assert_eq!(first, json!({"foo": "bar"}));
        assert_eq!(second, first);
        assert_eq!(transport.sent().len(), 1);

        let key = hash_key("GEThttps://jira.localhost/rest/api/latest/foo");
        assert_eq!(
            cache.get(&key),
            Some(json!({
                "body": "{\"foo\":\"bar\"}",
                "content_type": "application/json",
                "http_code": 200,
            }))
        );
    }

    #[tokio::test]
    async fn test_failed_get_is_not_cached() {
        let transport = RecordingTransport::new();
        transport.push_json(404, json!({"errorMessages": ["Issue does not exist"]}));
        let mut client = raw_client(&transport);
        let cache = Arc::new(MemoryCache::new());
        client.set_cache(cache.clone());

        assert!(client.get("issue/NOPE-1", &Value::Null).await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_get_appends_query_and_sends_credentials() {
        let transport = RecordingTransport::new();
        transport.push_json(200, json!([]));
        let client = raw_client(&transport);
        client.set_auth("jdoe", "token");

        client
            .get("user/search", &json!({"username": "jdoe"}))
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(
            sent[0].url,
            "https://jira.localhost/rest/api/latest/user/search?username=jdoe"
        );
        assert_eq!(sent[0].login, "jdoe");
        assert_eq!(sent[0].secret, "token");
    }

    #[tokio::test]
    async fn test_put_sends_json_payload() {
        let transport = RecordingTransport::new();
        transport.push(204, "", "");
        let client = raw_client(&transport);

        let result = client
            .put("issue/TEST-1", json!({"update": {}}))
            .await
            .unwrap();
        assert_eq!(result, Value::Null);
        assert_eq!(transport.sent()[0].payload, Payload::Json(json!({"update": {}})));
    }

    #[tokio::test]
    async fn test_unauthorized_html() {
        let transport = RecordingTransport::new();
        transport.push(401, "text/html;charset=UTF-8", "<html>login</html>");
        let client = raw_client(&transport);

        let err = client.get("myself", &Value::Null).await.unwrap_err();
        assert!(matches!(err, ApiError::Authorization(_)));
        assert_eq!(
            err.to_string(),
            "Jira API authorization failed, please check credentials"
        );
    }

    #[tokio::test]
    async fn test_forbidden_html() {
        let transport = RecordingTransport::new();
        transport.push(403, "text/html", "<html>captcha</html>");
        let client = raw_client(&transport);

        let err = client.get("myself", &Value::Null).await.unwrap_err();
        assert!(matches!(err, ApiError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_error_status_with_plain_text() {
        let transport = RecordingTransport::new();
        transport.push(502, "text/plain", "Bad gateway");
        let client = raw_client(&transport);

        let err = client.get("myself", &Value::Null).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("responded with code 502"));
        assert!(err.api_response().is_none());
    }

    #[tokio::test]
    async fn test_error_messages_in_json() {
        let transport = RecordingTransport::new();
        let body = json!({"errorMessages": ["first", "second"], "errors": {}});
        transport.push_json(400, body.clone());
        let client = raw_client(&transport);

        let err = client.post("issue", json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Jira REST API call error: first; second");
        assert_eq!(err.api_response(), Some(&body));
    }

    #[tokio::test]
    async fn test_field_errors_in_json() {
        let transport = RecordingTransport::new();
        transport.push_json(
            400,
            json!({"errorMessages": [], "errors": {"summary": "Field is required"}}),
        );
        let client = raw_client(&transport);

        let err = client.post("issue", json!({})).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Jira REST API returned an error:\n\tField is required"
        );
    }

    #[tokio::test]
    async fn test_message_in_json() {
        let transport = RecordingTransport::new();
        transport.push_json(500, json!({"message": "Internal failure"}));
        let client = raw_client(&transport);

        let err = client.post("issue", json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Jira REST API returned an error: Internal failure");
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let transport = RecordingTransport::new();
        transport.push(200, "application/json", "{not json");
        let client = raw_client(&transport);

        let err = client.get("myself", &Value::Null).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
        assert!(err.to_string().contains("{not json"));
    }

    #[tokio::test]
    async fn test_non_json_success() {
        let transport = RecordingTransport::new();
        transport.push(200, "text/plain", "plain text");
        transport.push(200, "text/plain", "plain text");
        let client = raw_client(&transport);

        let err = client.get("export", &Value::Null).await.unwrap_err();
        assert!(matches!(err, ApiError::NonJson));

        let raw = client.get_raw("export", &Value::Null).await.unwrap();
        assert_eq!(raw, "plain text");
    }

    #[tokio::test]
    async fn test_retries_transient_failure() {
        let transport = RecordingTransport::new();
        transport.push(503, "text/html", "maintenance");
        transport.push_json(200, json!({"ok": true}));
        let mut client = raw_client(&transport);
        client.set_max_retries(1);

        let result = client.get("serverInfo", &Value::Null).await.unwrap();
        assert_eq!(result, json!({"ok": true}));
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_no_retries_by_default() {
        let transport = RecordingTransport::new();
        transport.push(503, "text/html", "maintenance");
        let client = raw_client(&transport);

        let err = client.get("serverInfo", &Value::Null).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(transport.sent().len(), 1);
    }
}
