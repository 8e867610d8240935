//! Content-addressed response cache with TTL expiry.
//!
//! Keys are the MD5 digest of the task text plus the canonical JSON form
//! of the request context. `serde_json` serializes object keys in sorted
//! order, so equal contexts produce equal keys regardless of how the
//! caller assembled them.
//!
//! Capacity is enforced on insert: expired entries are purged first, and
//! if the store is still full the oldest entries are dropped down to a
//! watermark below the limit so a full cache does not re-evict on every
//! subsequent insert.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// How far below `max_size` eviction drains the store.
const OVER_EVICTION_BUFFER: usize = 100;

/// Cached routing result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub response: String,
    pub model_used: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: CachedResponse,
    stored_at: Instant,
}

/// TTL + capacity bounded response store.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    max_size: usize,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_size,
            ttl,
        }
    }

    /// Cache key for a (task, context) pair.
    pub fn generate_key(task: &str, context: Option<&serde_json::Value>) -> String {
        let mut material = task.to_string();
        if let Some(context) = context {
            // Map keys serialize sorted, giving a canonical form.
            material.push_str(&context.to_string());
        }
        format!("{:x}", md5::compute(material.as_bytes()))
    }

    /// Look up a key. Entries past their TTL are treated as absent and
    /// removed on the way out.
    pub fn get(&mut self, key: &str) -> Option<CachedResponse> {
        match self.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.payload.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a response under `key`, evicting as needed.
    pub fn insert(&mut self, key: String, payload: CachedResponse) {
        if self.entries.len() >= self.max_size {
            self.purge_expired();
        }
        if self.entries.len() >= self.max_size {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }

    /// Drop oldest-first until the store sits comfortably under the limit.
    fn evict_oldest(&mut self) {
        let target = self.max_size.saturating_sub(OVER_EVICTION_BUFFER);
        if self.entries.len() <= target {
            return;
        }
        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.stored_at))
            .collect();
        by_age.sort_by_key(|(_, stored_at)| *stored_at);

        let excess = self.entries.len() - target;
        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(text: &str) -> CachedResponse {
        CachedResponse {
            response: text.to_string(),
            model_used: "gpt-4o-mini".to_string(),
        }
    }

    #[test]
    fn test_key_is_deterministic() {
        let context = json!({"language": "rust", "session": 7});
        let a = ResponseCache::generate_key("explain lifetimes", Some(&context));
        let b = ResponseCache::generate_key("explain lifetimes", Some(&context));
        assert_eq!(a, b);

        let different = ResponseCache::generate_key("explain lifetimes", None);
        assert_ne!(a, different);
    }

    #[test]
    fn test_key_ignores_context_assembly_order() {
        let forward = json!({"a": 1, "b": 2});
        let reversed = json!({"b": 2, "a": 1});
        assert_eq!(
            ResponseCache::generate_key("task", Some(&forward)),
            ResponseCache::generate_key("task", Some(&reversed)),
        );
    }

    #[test]
    fn test_get_after_insert_returns_payload() {
        let mut cache = ResponseCache::new(100, Duration::from_secs(60));
        let key = ResponseCache::generate_key("task", None);
        cache.insert(key.clone(), payload("four"));
        assert_eq!(cache.get(&key), Some(payload("four")));
    }

    #[test]
    fn test_expired_entry_is_missed_and_purged() {
        let mut cache = ResponseCache::new(100, Duration::from_millis(10));
        let key = ResponseCache::generate_key("task", None);
        cache.insert(key.clone(), payload("stale"));
        std::thread::sleep(Duration::from_millis(25));

        assert_eq!(cache.get(&key), None);
        // The lookup itself removed the entry.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_eviction_drains_below_watermark() {
        let mut cache = ResponseCache::new(150, Duration::from_secs(60));
        for i in 0..150 {
            cache.insert(format!("key-{i}"), payload("x"));
        }
        assert_eq!(cache.len(), 150);

        cache.insert("key-newest".to_string(), payload("y"));
        // 150 drained to 150 - 100 = 50, plus the new entry.
        assert_eq!(cache.len(), 51);
        assert!(cache.get("key-newest").is_some());
    }

    #[test]
    fn test_eviction_prefers_purging_expired_entries() {
        let mut cache = ResponseCache::new(10, Duration::from_millis(10));
        for i in 0..10 {
            cache.insert(format!("key-{i}"), payload("x"));
        }
        std::thread::sleep(Duration::from_millis(25));

        cache.insert("fresh".to_string(), payload("y"));
        // Everything stale vanished; only the new entry remains.
        assert_eq!(cache.len(), 1);
        assert!(cache.get("fresh").is_some());
    }
}
