//! Per-client access token caches.
//!
//! Each federated client configuration gets its own [`Cache`], created lazily the first
//! time the client is seen and kept for the lifetime of the owning [`CacheRegistry`].
//! The registry is an ordinary value: the application creates one at startup, hands
//! it to the providers that need it, and drops it on shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use super::AccessToken;

/// Key under which a client's current access token is cached.
pub const ACCESS_TOKEN_CACHE_KEY: &str = "dingtalk_access_token";

const CACHE_NAME_PREFIX: &str = "dingtalk";

/// Key-addressed token store for a single client.
///
/// There is no TTL eviction: entries stay until they are invalidated or overwritten.
#[derive(Debug)]
pub struct Cache {
    name: String,
    entries: DashMap<String, AccessToken>,
}

impl Cache {
    fn new(name: String) -> Self {
        Self {
            name,
            entries: DashMap::new(),
        }
    }

    /// Cache name, `dingtalk:<client_id>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<AccessToken> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn put(&self, key: &str, token: AccessToken) {
        self.entries.insert(key.to_string(), token);
    }

    /// Remove the entry for `key`, returning it if there was one.
    pub fn invalidate(&self, key: &str) -> Option<AccessToken> {
        self.entries.remove(key).map(|(_, token)| token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registry of per-client caches with exactly-once creation per client id.
///
/// `cache_for` goes through the map's entry API, which holds the shard lock while the
/// cache is built, so concurrent first use of the same client id creates one cache
/// and every caller gets the same `Arc`.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    caches: DashMap<String, Arc<Cache>>,
    created: AtomicUsize,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cache for `client_id`, creating it on first access.
    pub fn cache_for(&self, client_id: &str) -> Arc<Cache> {
        self.caches
            .entry(client_id.to_string())
            .or_insert_with(|| {
                let name = format!("{}:{}", CACHE_NAME_PREFIX, client_id);
                self.created.fetch_add(1, Ordering::SeqCst);
                info!("Created token cache {}", name);
                Arc::new(Cache::new(name))
            })
            .value()
            .clone()
    }

    /// Number of caches created over the registry's lifetime.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of live caches.
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Drop every cache. Outstanding `Arc`s stay usable but are no longer shared.
    pub fn clear(&self) {
        debug!("Clearing {} token cache(s)", self.caches.len());
        self.caches.clear();
    }
}
