//! Response caching for the raw API client.
//!
//! The raw client memoizes successful GET responses through a [`ResponseCache`].
//! Three stores are provided:
//! - [`NullCache`] never stores anything (the default)
//! - [`MemoryCache`] keeps everything in an unbounded map until cleared
//! - [`FileCache`] writes JSON entries with a TTL under the platform cache dir,
//!   separated per profile

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

/// Default cache TTL in minutes.
pub const DEFAULT_CACHE_TTL_MINUTES: u32 = 30;

/// Keys longer than this are replaced with their hash.
const MAX_PLAIN_KEY_LEN: usize = 40;

/// A key/value store for decoded API responses.
///
/// Implementations use interior mutability so one cache can be shared between
/// clones of a client.
pub trait ResponseCache: Send + Sync {
    /// Fetch a value. `None` when absent or no longer valid.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value under `key`, replacing any previous one.
    fn set(&self, key: &str, value: Value) -> io::Result<()>;

    /// Check if `key` holds a value.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a single entry.
    fn delete(&self, key: &str) -> io::Result<()>;

    /// Drop every entry.
    fn clear(&self) -> io::Result<()>;
}

/// Hex-encoded SHA-256 digest of `data`.
pub fn hash_key(data: &str) -> String {
    let digest = Sha256::digest(data.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn is_digest(key: &str) -> bool {
    key.len() == 64 && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Build a cache key from a string.
///
/// Short strings are used as they are, longer ones are hashed.
pub fn compose_key(source: &str) -> String {
    if source.len() > MAX_PLAIN_KEY_LEN {
        hash_key(source)
    } else {
        source.to_string()
    }
}

/// Build a cache key from an ordered list of key/value pairs.
///
/// The pairs are flattened to `array:<all keys><all values>` before being
/// passed through [`compose_key`].
pub fn compose_pairs_key<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let keys: String = pairs.iter().map(|(k, _)| k.as_ref()).collect();
    let values: String = pairs.iter().map(|(_, v)| v.as_ref()).collect();
    compose_key(&format!("array:{}{}", keys, values))
}

/// A cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl ResponseCache for NullCache {
    fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    fn set(&self, _key: &str, _value: Value) -> io::Result<()> {
        Ok(())
    }

    fn has(&self, _key: &str) -> bool {
        false
    }

    fn delete(&self, _key: &str) -> io::Result<()> {
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Unbounded in-memory cache. Entries live until [`ResponseCache::clear`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.lock().ok()?;
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> io::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory cache lock poisoned"))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        Ok(())
    }
}

/// A cache entry with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached data.
    pub data: T,
    /// When the entry was cached (Unix timestamp).
    pub cached_at: u64,
    /// When the entry expires (Unix timestamp).
    pub expires_at: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

impl<T> CacheEntry<T> {
    /// Create a new cache entry with the given TTL.
    pub fn new(data: T, ttl: Duration) -> Self {
        let now = unix_now();
        Self {
            data,
            cached_at: now,
            expires_at: now + ttl.as_secs(),
        }
    }

    /// Check if the cache entry has expired.
    pub fn is_expired(&self) -> bool {
        unix_now() > self.expires_at
    }

    /// Get the age of the cache entry.
    pub fn age(&self) -> Duration {
        Duration::from_secs(unix_now().saturating_sub(self.cached_at))
    }
}

/// Disk cache storing one JSON file per key.
///
/// Expired and corrupted entries are removed when they are read. There is no
/// size limit; use [`FileCache::clear`] to drop everything.
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Base directory for cache storage.
    base_dir: PathBuf,
    /// Current profile name.
    profile: String,
    /// Cache TTL.
    ttl: Duration,
}

impl FileCache {
    /// Create a file cache for the given profile in the platform cache dir.
    pub fn new(profile: &str, ttl_minutes: u32) -> io::Result<Self> {
        let base_dir = dirs::cache_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "No cache directory available"))?
            .join("jira-client");

        Ok(Self::with_base_dir(base_dir, profile, ttl_minutes))
    }

    /// Create a file cache rooted at an explicit directory.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>, profile: &str, ttl_minutes: u32) -> Self {
        Self {
            base_dir: base_dir.into(),
            profile: profile.to_string(),
            ttl: Duration::from_secs(ttl_minutes as u64 * 60),
        }
    }

    fn profile_dir(&self) -> PathBuf {
        self.base_dir.join(&self.profile)
    }

    /// Keys that are already SHA-256 digests name their file directly; any
    /// other key is hashed first.
    fn entry_path(&self, key: &str) -> PathBuf {
        let file_key = if is_digest(key) {
            key.to_string()
        } else {
            hash_key(key)
        };
        self.profile_dir()
            .join("responses")
            .join(format!("{}.json", file_key))
    }

    fn read_entry(&self, path: &Path) -> Option<Value> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!("Failed to read cache file {:?}: {}", path, e);
                }
                return None;
            }
        };

        let entry: CacheEntry<Value> = match serde_json::from_str(&content) {
            Ok(e) => e,
            Err(e) => {
                debug!("Failed to parse cache entry {:?}: {}", path, e);
                let _ = fs::remove_file(path);
                return None;
            }
        };

        if entry.is_expired() {
            trace!("Cache expired for {:?}", path);
            let _ = fs::remove_file(path);
            return None;
        }

        trace!("Cache hit for {:?} (age: {:?})", path, entry.age());
        Some(entry.data)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let profile_dir = self.profile_dir();
        let mut file_count = 0u64;
        let mut total_size = 0u64;

        if profile_dir.exists() {
            for entry in walkdir::WalkDir::new(&profile_dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                file_count += 1;
                if let Ok(metadata) = entry.metadata() {
                    total_size += metadata.len();
                }
            }
        }

        CacheStats {
            file_count,
            total_size_bytes: total_size,
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}

impl ResponseCache for FileCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.read_entry(&self.entry_path(key))
    }

    fn set(&self, key: &str, value: Value) -> io::Result<()> {
        let path = self.entry_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entry = CacheEntry::new(value, self.ttl);
        let content = serde_json::to_string(&entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        fs::write(&path, content)?;
        trace!("Cached response to {:?}", path);
        Ok(())
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        let dir = self.profile_dir();
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
            debug!("Cleared response cache for profile {}", self.profile);
        } else {
            warn!("Nothing to clear, cache dir {:?} does not exist", dir);
        }
        Ok(())
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cached files.
    pub file_count: u64,
    /// Total size in bytes.
    pub total_size_bytes: u64,
    /// TTL in seconds.
    pub ttl_seconds: u64,
}

impl CacheStats {
    /// Get total size in MB.
    pub fn total_size_mb(&self) -> f64 {
        self.total_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_compose_key_short_string() {
        assert_eq!(compose_key("foo"), "foo");
    }

    #[test]
    fn test_compose_key_long_string() {
        let source = "x".repeat(41);
        assert_eq!(compose_key(&source), hash_key(&source));
        assert_eq!(compose_key(&source).len(), 64);
    }

    #[test]
    fn test_compose_key_exactly_forty_chars() {
        let source = "y".repeat(40);
        assert_eq!(compose_key(&source), source);
    }

    #[test]
    fn test_compose_pairs_key_short() {
        assert_eq!(compose_pairs_key(&[("foo", "bar")]), "array:foobar");
    }

    #[test]
    fn test_compose_pairs_key_long() {
        let value = "x".repeat(40);
        assert_eq!(
            compose_pairs_key(&[("foo", value.as_str())]),
            hash_key(&format!("array:foo{}", value))
        );
    }

    #[test]
    fn test_hash_key_known_digest() {
        assert_eq!(
            hash_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_null_cache_never_stores() {
        let cache = NullCache;
        cache.set("key", json!({"foo": "bar"})).unwrap();
        assert!(!cache.has("key"));
        assert!(cache.get("key").is_none());
    }

    #[test]
    fn test_memory_cache_set_get_delete() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty());

        cache.set("a", json!(1)).unwrap();
        cache.set("b", json!({"x": true})).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.has("a"));
        assert_eq!(cache.get("b"), Some(json!({"x": true})));

        cache.delete("a").unwrap();
        assert!(!cache.has("a"));

        cache.clear().unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_entry_new() {
        let entry = CacheEntry::new("test data", Duration::from_secs(60));
        assert!(!entry.is_expired());
        assert!(entry.age() < Duration::from_secs(1));
    }

    #[test]
    fn test_cache_entry_expired() {
        let entry = CacheEntry::new("test data", Duration::from_secs(1));
        assert!(!entry.is_expired());
        thread::sleep(Duration::from_secs(2));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_file_cache_roundtrip() {
        let dir = tempdir().unwrap();
        let cache = FileCache::with_base_dir(dir.path(), "test", 5);

        let value = json!({"body": "{\"key\":\"TEST-1\"}", "http_code": 200});
        cache.set("some-key", value.clone()).unwrap();

        assert!(cache.has("some-key"));
        assert_eq!(cache.get("some-key"), Some(value));
        assert!(cache.get("other-key").is_none());
    }

    #[test]
    fn test_file_cache_removes_corrupted_entry() {
        let dir = tempdir().unwrap();
        let cache = FileCache::with_base_dir(dir.path(), "test", 5);

        let path = cache.entry_path("broken");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json at all").unwrap();

        assert!(cache.get("broken").is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_file_cache_removes_expired_entry() {
        let dir = tempdir().unwrap();
        let cache = FileCache::with_base_dir(dir.path(), "test", 0);

        cache.set("old", json!("value")).unwrap();
        let path = cache.entry_path("old");
        assert!(path.exists());

        thread::sleep(Duration::from_secs(2));
        assert!(cache.get("old").is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_file_cache_profiles_are_separated() {
        let dir = tempdir().unwrap();
        let work = FileCache::with_base_dir(dir.path(), "work", 5);
        let home = FileCache::with_base_dir(dir.path(), "home", 5);

        work.set("k", json!("work")).unwrap();
        assert!(home.get("k").is_none());
        assert_eq!(work.get("k"), Some(json!("work")));
    }

    #[test]
    fn test_file_cache_clear_and_stats() {
        let dir = tempdir().unwrap();
        let cache = FileCache::with_base_dir(dir.path(), "test", 5);

        let stats = cache.stats();
        assert_eq!(stats.file_count, 0);
        assert_eq!(stats.total_size_bytes, 0);
        assert_eq!(stats.ttl_seconds, 300);

        for i in 0..3 {
            cache.set(&format!("key-{}", i), json!(i)).unwrap();
        }
        let stats = cache.stats();
        assert_eq!(stats.file_count, 3);
        assert!(stats.total_size_bytes > 0);
        assert!(stats.total_size_mb() > 0.0);

        cache.clear().unwrap();
        assert_eq!(cache.stats().file_count, 0);
    }

    #[test]
    fn test_file_cache_odd_characters_in_keys() {
        let dir = tempdir().unwrap();
        let cache = FileCache::with_base_dir(dir.path(), "test", 5);

        cache.set("GET/with:odd*chars", json!(1)).unwrap();
        assert_eq!(cache.get("GET/with:odd*chars"), Some(json!(1)));
    }

    #[test]
    fn test_file_cache_keys_do_not_collide() {
        let dir = tempdir().unwrap();
        let cache = FileCache::with_base_dir(dir.path(), "test", 5);

        cache.set("array:x", json!("colon")).unwrap();
        cache.set("array_x", json!("underscore")).unwrap();
        cache.set("array x", json!("space")).unwrap();

        assert_eq!(cache.get("array:x"), Some(json!("colon")));
        assert_eq!(cache.get("array_x"), Some(json!("underscore")));
        assert_eq!(cache.get("array x"), Some(json!("space")));
        assert_eq!(cache.stats().file_count, 3);
    }

    #[test]
    fn test_file_cache_uses_digest_keys_as_file_names() {
        let dir = tempdir().unwrap();
        let cache = FileCache::with_base_dir(dir.path(), "test", 5);

        let digest = compose_key(&"x".repeat(100));
        assert_eq!(
            cache.entry_path(&digest).file_name().unwrap().to_str().unwrap(),
            format!("{}.json", digest)
        );
        assert_ne!(cache.entry_path("short"), cache.entry_path("SHORT"));
    }
}
