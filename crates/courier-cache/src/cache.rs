use crate::config::{CacheConfig, CacheConfigBuilder};
use crate::events::CacheEvent;
use crate::store::CacheStore;
use courier_core::{
    BoxFuture, Flow, HttpError, HttpResponse, Method, Middleware, Request, RequestContext,
    StatusCode,
};
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// In-memory cache of successful GET responses, keyed by the full request URL.
///
/// Only `200 OK` responses whose `Cache-Control` header carries neither
/// `no-cache` nor `no-store` are stored. A hit answers the request without
/// touching the network and the returned response reports
/// [`is_from_cache`](HttpResponse::is_from_cache).
///
/// Cloning is cheap; clones share the same entries.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<Inner>,
}

struct Inner {
    config: CacheConfig,
    store: Mutex<CacheStore>,
}

impl ResponseCache {
    /// Creates a cache holding at most 1000 responses for `ttl` each.
    pub fn new(ttl: Duration) -> Self {
        Self::builder().ttl(ttl).build()
    }

    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    pub(crate) fn from_config(config: CacheConfig) -> Self {
        let store = CacheStore::new(config.max_size, config.ttl);
        Self {
            inner: Arc::new(Inner {
                config,
                store: Mutex::new(store),
            }),
        }
    }

    fn store(&self) -> MutexGuard<'_, CacheStore> {
        self.inner
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the live entry for `url`, marked as served from cache.
    pub fn get(&self, url: &str) -> Option<HttpResponse> {
        let hit = self.store().get(url);
        let name = self.inner.config.name.clone();

        match &hit {
            Some(_) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(cache = %name, url, "cache hit");

                #[cfg(feature = "metrics")]
                counter!("courier_cache_requests_total", "cache" => name.clone(), "result" => "hit")
                    .increment(1);

                self.inner.config.event_listeners.emit(&CacheEvent::Hit {
                    pattern_name: name,
                    timestamp: Instant::now(),
                    key: url.to_string(),
                });
            }
            None => {
                #[cfg(feature = "metrics")]
                counter!("courier_cache_requests_total", "cache" => name.clone(), "result" => "miss")
                    .increment(1);

                self.inner.config.event_listeners.emit(&CacheEvent::Miss {
                    pattern_name: name,
                    timestamp: Instant::now(),
                    key: url.to_string(),
                });
            }
        }

        hit.map(HttpResponse::into_cached)
    }

    /// Stores `response` under `url`, replacing any previous entry.
    pub fn insert(&self, url: &str, response: HttpResponse) {
        let (evicted, len) = {
            let mut store = self.store();
            let evicted = store.insert(url.to_string(), response);
            (evicted, store.len())
        };
        let name = &self.inner.config.name;

        #[cfg(feature = "metrics")]
        gauge!("courier_cache_size", "cache" => name.clone()).set(len as f64);
        #[cfg(not(feature = "metrics"))]
        let _ = len;

        self.inner.config.event_listeners.emit(&CacheEvent::Stored {
            pattern_name: name.clone(),
            timestamp: Instant::now(),
            key: url.to_string(),
        });
        if let Some(key) = evicted {
            self.inner.config.event_listeners.emit(&CacheEvent::Evicted {
                pattern_name: name.clone(),
                timestamp: Instant::now(),
                key,
            });
        }
    }

    /// Drops the entry for `url`. Returns true if there was one.
    pub fn invalidate(&self, url: &str) -> bool {
        self.store().remove(url)
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.store().purge_expired()
    }

    pub fn clear(&self) {
        self.store().clear();
    }

    /// Number of stored entries, including ones that expired but were not
    /// looked up since.
    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.inner.config.ttl
    }
}

/// Returns true if the response may be stored.
pub fn is_cacheable(response: &HttpResponse) -> bool {
    if response.status() != StatusCode::OK || response.is_from_cache() {
        return false;
    }
    match response.header("cache-control") {
        Some(value) => !value.split(',').any(|directive| {
            let directive = directive.trim();
            directive.eq_ignore_ascii_case("no-cache") || directive.eq_ignore_ascii_case("no-store")
        }),
        None => true,
    }
}

impl Middleware for ResponseCache {
    fn name(&self) -> &str {
        "cache"
    }

    fn before_request<'a>(
        &'a self,
        _request: &'a mut Request,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Flow, HttpError>> {
        Box::pin(async move {
            if *ctx.method() != Method::GET {
                return Ok(Flow::Continue);
            }
            Ok(match self.get(ctx.url().as_str()) {
                Some(response) => Flow::Respond(response),
                None => Flow::Continue,
            })
        })
    }

    fn after_response<'a>(
        &'a self,
        response: &'a HttpResponse,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<(), HttpError>> {
        Box::pin(async move {
            if *ctx.method() == Method::GET && is_cacheable(response) {
                self.insert(ctx.url().as_str(), response.clone());
            }
            Ok(())
        })
    }
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("name", &self.inner.config.name)
            .field("ttl", &self.inner.config.ttl)
            .field("max_size", &self.inner.config.max_size)
            .field("len", &self.len())
            .finish()
    }
}
