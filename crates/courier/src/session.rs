//! Sessions: a connection pool plus the middlewares every request runs
//! through.

use crate::engine;
use crate::request::RequestSpec;
use courier_core::{HttpError, HttpResponse, Middleware, MiddlewareStack, SharedMiddleware};
use courier_pool::{ConnectionPool, PoolConfig, PoolError};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// A reusable HTTP client.
///
/// Cloning a session is cheap; clones share the pool and the middleware
/// list, so a middleware added through one clone applies to all of them.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    pool: ConnectionPool,
    middlewares: RwLock<MiddlewareStack>,
    default_timeout: Option<Duration>,
}

impl Session {
    /// Creates a session with the default pool profile and no middlewares.
    pub fn new() -> Result<Self, PoolError> {
        Self::builder().build()
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Performs a request through the session and request middlewares.
    ///
    /// Session middlewares run first, followed by the request's own. The
    /// returned future can be dropped to cancel the request.
    pub async fn execute(&self, spec: RequestSpec) -> Result<HttpResponse, HttpError> {
        let stack = self.middlewares().concat(spec.middlewares());
        engine::execute(&self.inner.pool, &stack, &spec, self.inner.default_timeout).await
    }

    pub fn get(&self, url: impl Into<String>) -> RequestSpec {
        RequestSpec::get(url)
    }

    pub fn post(&self, url: impl Into<String>) -> RequestSpec {
        RequestSpec::post(url)
    }

    pub fn put(&self, url: impl Into<String>) -> RequestSpec {
        RequestSpec::put(url)
    }

    pub fn patch(&self, url: impl Into<String>) -> RequestSpec {
        RequestSpec::patch(url)
    }

    pub fn delete(&self, url: impl Into<String>) -> RequestSpec {
        RequestSpec::delete(url)
    }

    pub fn head(&self, url: impl Into<String>) -> RequestSpec {
        RequestSpec::head(url)
    }

    /// Appends a session-wide middleware.
    pub fn add_middleware<M>(&self, middleware: M)
    where
        M: Middleware + 'static,
    {
        self.write_middlewares().push(Arc::new(middleware));
    }

    /// Replaces every session-wide middleware.
    pub fn set_middlewares(&self, middlewares: Vec<SharedMiddleware>) {
        self.write_middlewares().set(middlewares);
    }

    pub fn clear_middlewares(&self) {
        self.write_middlewares().clear();
    }

    /// A snapshot of the session-wide middlewares.
    pub fn middlewares(&self) -> MiddlewareStack {
        self.inner
            .middlewares
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.inner.pool
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.inner.default_timeout
    }

    /// Closes the pool. Requests issued afterwards fail with an internal
    /// error; calling `close` again has no effect.
    pub fn close(&self) {
        self.inner.pool.close();
    }

    fn write_middlewares(&self) -> std::sync::RwLockWriteGuard<'_, MiddlewareStack> {
        self.inner
            .middlewares
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("pool", &self.inner.pool)
            .field("middlewares", &self.middlewares())
            .field("default_timeout", &self.inner.default_timeout)
            .finish()
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    pool: Option<ConnectionPool>,
    pool_config: PoolConfig,
    middlewares: MiddlewareStack,
    default_timeout: Option<Duration>,
    gzip: bool,
    user_agent: Option<String>,
    name: String,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - pool: [`PoolConfig::default`], adaptive scaling off
    /// - no middlewares
    /// - timeout: 30 seconds
    /// - gzip: enabled
    /// - name: `"courier"`
    pub fn new() -> Self {
        Self {
            pool: None,
            pool_config: PoolConfig::default(),
            middlewares: MiddlewareStack::new(),
            default_timeout: Some(Duration::from_secs(30)),
            gzip: true,
            user_agent: None,
            name: "courier".to_string(),
        }
    }

    /// Uses an existing pool. Transport settings on this builder are then
    /// ignored, since the pool already owns its transport.
    pub fn pool(mut self, pool: ConnectionPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Builds the session's own pool from `config`.
    pub fn pool_config(mut self, config: PoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    /// Appends a session-wide middleware.
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Bounds each attempt of requests that set neither a timeout nor a
    /// deadline. Retries that would wait at least this long are skipped.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Removes the default bound.
    pub fn no_timeout(mut self) -> Self {
        self.default_timeout = None;
        self
    }

    /// Whether responses are transparently gunzipped.
    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }

    /// Sets the `User-Agent` sent when no middleware overrides it.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the name used for the pool in events, logs and metric labels.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> Result<Session, PoolError> {
        let pool = match self.pool {
            Some(pool) => pool,
            None => {
                let gzip = self.gzip;
                let user_agent = self.user_agent;
                ConnectionPool::builder()
                    .config(self.pool_config)
                    .name(self.name)
                    .configure_transport(move |builder| {
                        let builder = builder.gzip(gzip);
                        match &user_agent {
                            Some(user_agent) => builder.user_agent(user_agent.clone()),
                            None => builder,
                        }
                    })
                    .build()?
            }
        };

        tracing::debug!(
            middlewares = self.middlewares.len(),
            timeout_ms = self.default_timeout.map(|t| t.as_millis() as u64),
            "session created"
        );

        Ok(Session {
            inner: Arc::new(SessionInner {
                pool,
                middlewares: RwLock::new(self.middlewares),
                default_timeout: self.default_timeout,
            }),
        })
    }
}
