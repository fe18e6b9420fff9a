//! JIRA API client.
//!
//! [`Client`] is the entry point of the crate. It owns one [`RawClient`] and
//! hands out section handles grouping the REST operations of one resource
//! type. Clones share the raw client and the memoized dictionaries.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use super::error::Result;
use super::raw::RawClient;
use super::sections::{
    AttachmentSection, ComponentSection, DictionarySection, FieldSection, GroupSection,
    IssueLinkSection, IssueLinkTypeSection, IssueSection, JqlSection, ProjectSection,
    SecurityLevelSection, UserSection, VersionSection,
};
use super::transport::HttpTransport;
use super::types::parse_id;
use crate::cache::{FileCache, MemoryCache, NullCache, ResponseCache};
use crate::config::{CacheKind, Profile, Settings};

/// Lock a memo, ignoring poisoning: memo data stays consistent between calls.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Id-indexed memo of a dictionary section.
#[derive(Debug, Default)]
pub(crate) struct Memo {
    /// Full list in API order, once it was requested.
    all: Option<Vec<Value>>,
    items: BTreeMap<u64, Value>,
}

impl Memo {
    pub(crate) fn get(&self, id: u64) -> Option<Value> {
        self.items.get(&id).cloned()
    }

    pub(crate) fn all(&self) -> Option<Vec<Value>> {
        self.all.clone()
    }

    pub(crate) fn insert(&mut self, item: Value) {
        let id = item.get("id").map(parse_id).unwrap_or(0);
        self.items.insert(id, item);
    }

    pub(crate) fn fill(&mut self, items: Vec<Value>) {
        self.items.clear();
        for item in &items {
            self.insert(item.clone());
        }
        self.all = Some(items);
    }

    pub(crate) fn remove(&mut self, id: u64) {
        self.items.remove(&id);
        if let Some(all) = &mut self.all {
            all.retain(|item| item.get("id").map(parse_id) != Some(id));
        }
    }

    pub(crate) fn clear(&mut self) {
        self.all = None;
        self.items.clear();
    }
}

/// Users memoized by key and by name.
#[derive(Debug, Default)]
pub(crate) struct UserMemo {
    pub by_key: HashMap<String, Value>,
    pub by_name: HashMap<String, Value>,
}

#[derive(Debug, Default)]
pub(crate) struct Memos {
    pub link_types: Mutex<Memo>,
    pub issue_types: Mutex<Memo>,
    pub priorities: Mutex<Memo>,
    pub resolutions: Mutex<Memo>,
    pub statuses: Mutex<Memo>,
    pub status_categories: Mutex<Memo>,
    pub security_levels: Mutex<Memo>,
    pub users: Mutex<UserMemo>,
}

#[derive(Debug)]
struct ClientInner {
    raw: RawClient,
    memos: Memos,
}

/// Client to the JIRA REST API.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Create a client for a JIRA instance using the default transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be built.
    pub fn new(jira_url: &str, api_prefix: &str) -> Result<Self> {
        Ok(Self::from_raw(RawClient::new(jira_url, api_prefix)?))
    }

    /// Create a client sending requests through `transport`.
    pub fn with_transport(jira_url: &str, api_prefix: &str, transport: Box<dyn HttpTransport>) -> Self {
        Self::from_raw(RawClient::with_transport(jira_url, api_prefix, transport))
    }

    /// Wrap a configured raw client.
    pub fn from_raw(raw: RawClient) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                raw,
                memos: Memos::default(),
            }),
        }
    }

    /// Build a client for a profile, reading its token from the OS keychain.
    pub fn from_profile(profile: &Profile, settings: &Settings) -> crate::Result<Self> {
        let token = profile.token()?;
        Self::from_profile_with_token(profile, settings, &token)
    }

    /// Build a client for a profile with an explicit token.
    pub fn from_profile_with_token(
        profile: &Profile,
        settings: &Settings,
        token: &str,
    ) -> crate::Result<Self> {
        profile.validate()?;

        let mut raw = RawClient::new(&profile.url, &profile.api_prefix)?;
        raw.set_request_timeout(Duration::from_secs(settings.timeout_secs));
        raw.set_max_retries(settings.max_retries);

        let cache: Arc<dyn ResponseCache> = match settings.cache.kind {
            CacheKind::None => Arc::new(NullCache),
            CacheKind::Memory => Arc::new(MemoryCache::new()),
            CacheKind::Disk => Arc::new(FileCache::new(&profile.name, settings.cache.ttl_minutes)?),
        };
        raw.set_cache(cache);
        raw.set_auth(&profile.email, token);

        debug!(profile = %profile.name, url = %raw.jira_url(), "Created client from profile");
        Ok(Self::from_raw(raw))
    }

    /// The underlying raw client.
    pub fn raw(&self) -> &RawClient {
        &self.inner.raw
    }

    pub(crate) fn memos(&self) -> &Memos {
        &self.inner.memos
    }

    /// Change the credentials used by this client and all its clones.
    pub fn set_auth(&self, login: &str, secret: &str) {
        self.inner.raw.set_auth(login, secret);
    }

    /// URL of the JIRA web UI root.
    pub fn jira_url(&self) -> &str {
        self.inner.raw.jira_url()
    }

    /// Search issues with JQL and return the raw API answer.
    #[instrument(skip(self, fields, expand))]
    pub async fn search(
        &self,
        jql: &str,
        fields: &[&str],
        expand: &[&str],
        max_results: u32,
        start_at: u32,
        validate_query: bool,
    ) -> Result<Value> {
        let mut args = Map::new();
        args.insert("jql".into(), json!(jql));
        args.insert("startAt".into(), json!(start_at));
        args.insert("maxResults".into(), json!(max_results));
        args.insert("validateQuery".into(), json!(validate_query));
        if !fields.is_empty() {
            args.insert("fields".into(), json!(fields));
        }
        if !expand.is_empty() {
            args.insert("expand".into(), json!(expand));
        }
        self.inner.raw.post("/search", Value::Object(args)).await
    }

    /// Drop every memoized dictionary and user.
    pub fn clear_memos(&self) {
        let memos = &self.inner.memos;
        for memo in [
            &memos.link_types,
            &memos.issue_types,
            &memos.priorities,
            &memos.resolutions,
            &memos.statuses,
            &memos.status_categories,
            &memos.security_levels,
        ] {
            lock(memo).clear();
        }
        let mut users = lock(&memos.users);
        users.by_key.clear();
        users.by_name.clear();
    }

    pub fn attachment(&self) -> AttachmentSection<'_> {
        AttachmentSection::new(self)
    }

    pub fn component(&self) -> ComponentSection<'_> {
        ComponentSection::new(self)
    }

    pub fn field(&self) -> FieldSection<'_> {
        FieldSection::new(self)
    }

    pub fn group(&self) -> GroupSection<'_> {
        GroupSection::new(self)
    }

    pub fn issue(&self) -> IssueSection<'_> {
        IssueSection::new(self)
    }

    pub fn issue_link(&self) -> IssueLinkSection<'_> {
        IssueLinkSection::new(self)
    }

    pub fn issue_link_type(&self) -> IssueLinkTypeSection<'_> {
        IssueLinkTypeSection::new(self)
    }

    pub fn issue_type(&self) -> DictionarySection<'_> {
        DictionarySection::new(self, "issuetype", &self.inner.memos.issue_types)
    }

    pub fn jql(&self) -> JqlSection<'_> {
        JqlSection::new(self)
    }

    pub fn priority(&self) -> DictionarySection<'_> {
        DictionarySection::new(self, "priority", &self.inner.memos.priorities)
    }

    pub fn project(&self) -> ProjectSection<'_> {
        ProjectSection::new(self)
    }

    pub fn resolution(&self) -> DictionarySection<'_> {
        DictionarySection::new(self, "resolution", &self.inner.memos.resolutions)
    }

    pub fn security_level(&self) -> SecurityLevelSection<'_> {
        SecurityLevelSection::new(self)
    }

    pub fn status(&self) -> DictionarySection<'_> {
        DictionarySection::new(self, "status", &self.inner.memos.statuses)
    }

    pub fn status_category(&self) -> DictionarySection<'_> {
        DictionarySection::new(self, "statuscategory", &self.inner.memos.status_categories)
    }

    pub fn user(&self) -> UserSection<'_> {
        UserSection::new(self)
    }

    pub fn version(&self) -> VersionSection<'_> {
        VersionSection::new(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::raw::tests::RecordingTransport;
    use crate::api::transport::{Payload, RequestMethod};

    /// Client answering from a queue of canned responses.
    pub(crate) fn test_client() -> (Client, RecordingTransport) {
        let transport = RecordingTransport::new();
        let client = Client::with_transport(
            "https://jira.localhost/",
            "/rest/api/latest/",
            Box::new(transport.clone()),
        );
        (client, transport)
    }

    /// Path and query of a sent URL, relative to the API root.
    pub(crate) fn api_path(url: &str) -> &str {
        url.strip_prefix("https://jira.localhost/rest/api/latest/")
            .unwrap_or(url)
    }

    #[tokio::test]
    async fn test_search_body() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({"issues": [], "total": 0}));

        let result = client
            .search("project = TEST", &["summary"], &[], 50, 0, true)
            .await
            .unwrap();
        assert_eq!(result["total"], 0);

        let sent = transport.sent();
        assert_eq!(sent[0].method, RequestMethod::Post);
        assert_eq!(api_path(&sent[0].url), "search");
        assert_eq!(
            sent[0].payload,
            Payload::Json(json!({
                "jql": "project = TEST",
                "startAt": 0,
                "maxResults": 50,
                "validateQuery": true,
                "fields": ["summary"],
            }))
        );
    }

    #[tokio::test]
    async fn test_clones_share_credentials() {
        let (client, transport) = test_client();
        transport.push_json(200, json!({}));
        let other = client.clone();
        client.set_auth("jdoe", "token");

        other.raw().get("myself", &Value::Null).await.unwrap();
        assert_eq!(transport.sent()[0].login, "jdoe");
    }

    #[test]
    fn test_memo_keeps_order_and_index() {
        let mut memo = Memo::default();
        memo.fill(vec![json!({"id": "3", "name": "High"}), json!({"id": "1", "name": "Low"})]);

        assert_eq!(memo.get(1).unwrap()["name"], "Low");
        let all = memo.all().unwrap();
        assert_eq!(all[0]["name"], "High");

        memo.remove(3);
        assert!(memo.get(3).is_none());
        assert_eq!(memo.all().unwrap().len(), 1);

        memo.clear();
        assert!(memo.all().is_none());
    }

    #[test]
    fn test_from_profile_with_token() {
        let profile = Profile::new(
            "work".to_string(),
            "https://company.atlassian.net".to_string(),
            "user@company.com".to_string(),
        )
        .with_api_prefix("/rest/api/2/");
        let mut settings = Settings::default();
        settings.timeout_secs = 5;
        settings.max_retries = 2;
        settings.cache.kind = CacheKind::Memory;

        let client = Client::from_profile_with_token(&profile, &settings, "token").unwrap();
        assert_eq!(client.jira_url(), "https://company.atlassian.net/");
        assert_eq!(client.raw().api_prefix(), "rest/api/2/");
        assert_eq!(client.raw().request_timeout(), Duration::from_secs(5));
        assert_eq!(client.raw().max_retries(), 2);
        assert_eq!(client.raw().login(), "user@company.com");
    }

    #[test]
    fn test_from_profile_rejects_invalid_profile() {
        let profile = Profile::new(
            "work".to_string(),
            "company.atlassian.net".to_string(),
            "user@company.com".to_string(),
        );
        assert!(Client::from_profile_with_token(&profile, &Settings::default(), "t").is_err());
    }
}
