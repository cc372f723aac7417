//! Cache storage implementation.

use courier_core::HttpResponse;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

/// A stored response and the moment it stops being served.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub response: HttpResponse,
    pub expires_at: Instant,
}

impl CacheEntry {
    fn new(response: HttpResponse, ttl: Duration) -> Self {
        Self {
            response,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// LRU-bounded map from request URL to [`CacheEntry`].
pub(crate) struct CacheStore {
    entries: LruCache<String, CacheEntry>,
    ttl: Duration,
}

impl CacheStore {
    /// A capacity of zero falls back to 1000 entries.
    pub(crate) fn new(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN.saturating_add(999));
        Self {
            entries: LruCache::new(cap),
            ttl,
        }
    }

    /// Gets a response if it exists and has not expired. Expired entries are
    /// dropped on the way.
    pub(crate) fn get(&mut self, key: &str) -> Option<HttpResponse> {
        let expired = self.entries.get(key)?.is_expired();
        if expired {
            self.entries.pop(key);
            None
        } else {
            self.entries.get(key).map(|entry| entry.response.clone())
        }
    }

    /// Inserts a response. Returns the key of the least recently used entry
    /// if one had to be evicted.
    pub(crate) fn insert(&mut self, key: String, response: HttpResponse) -> Option<String> {
        let entry = CacheEntry::new(response, self.ttl);
        match self.entries.push(key.clone(), entry) {
            Some((evicted, _)) if evicted != key => Some(evicted),
            _ => None,
        }
    }

    pub(crate) fn remove(&mut self, key: &str) -> bool {
        self.entries.pop(key).is_some()
    }

    /// Drops every expired entry and returns how many were removed.
    pub(crate) fn purge_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.entries.pop(key);
        }
        expired.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
