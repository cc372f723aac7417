//! Connection pool manager.

use crate::adjust::{plan_adjustment, Adjustment};
use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::events::PoolEvent;
use crate::stats::ConnectionStats;
use courier_core::events::{EventListeners, FnListener};
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

type TransportCustomizer =
    dyn Fn(reqwest::ClientBuilder) -> reqwest::ClientBuilder + Send + Sync + 'static;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the HTTP transport and keeps its idle-connection ceiling matched to
/// observed load.
///
/// Cloning a `ConnectionPool` is cheap and every clone refers to the same
/// transport, statistics and monitor task.
///
/// # Examples
///
/// ```rust,no_run
/// use courier_pool::{ConnectionPool, PoolConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = ConnectionPool::builder()
///     .config(PoolConfig::low_latency())
///     .name("billing-api")
///     .on_resized(|from, to| println!("idle ceiling {} -> {}", from, to))
///     .build()?;
///
/// let client = pool.client()?;
/// let _ = client.get("https://example.com").send().await?;
///
/// pool.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    name: String,
    config: Mutex<PoolConfig>,
    stats: Mutex<ConnectionStats>,
    transport: RwLock<Option<reqwest::Client>>,
    customize: Option<Arc<TransportCustomizer>>,
    monitor: Mutex<Option<JoinHandle<()>>>,
    listeners: EventListeners<PoolEvent>,
    closed: AtomicBool,
}

impl ConnectionPool {
    /// Builds a pool from `config`.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        Self::builder().config(config).build()
    }

    /// Builds a pool with [`PoolConfig::default`].
    pub fn with_defaults() -> Result<Self, PoolError> {
        Self::new(PoolConfig::default())
    }

    pub fn builder() -> ConnectionPoolBuilder {
        ConnectionPoolBuilder::new()
    }

    /// Returns a handle to the live transport.
    ///
    /// The handle stays usable after a rescale; it just keeps the idle
    /// ceiling that was current when it was taken.
    pub fn client(&self) -> Result<reqwest::Client, PoolError> {
        self.inner
            .transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(PoolError::Closed)
    }

    /// Returns a copy of the current configuration.
    pub fn config(&self) -> PoolConfig {
        lock(&self.inner.config).clone()
    }

    /// Returns a snapshot of the utilization statistics.
    pub fn stats(&self) -> ConnectionStats {
        let mut stats = lock(&self.inner.stats).clone();
        stats.max_idle_per_host = lock(&self.inner.config).max_idle_per_host;
        stats
    }

    /// Marks one exchange as holding a connection until the guard drops.
    pub fn track(&self) -> ConnectionGuard {
        {
            let mut stats = lock(&self.inner.stats);
            stats.active_connections += 1;
            stats.idle_connections = stats.idle_connections.saturating_sub(1);

            #[cfg(feature = "metrics")]
            gauge!("courier_pool_active_connections", "pool" => self.inner.name.clone())
                .set(stats.active_connections as f64);
        }
        ConnectionGuard {
            pool: Arc::downgrade(&self.inner),
        }
    }

    /// Records the outcome of one exchange and its time to first response
    /// byte.
    pub fn record_request(&self, success: bool, connect_duration: Duration) {
        lock(&self.inner.stats).record(success, connect_duration);

        #[cfg(feature = "metrics")]
        {
            let outcome = if success { "success" } else { "failure" };
            counter!("courier_pool_requests_total", "pool" => self.inner.name.clone(), "outcome" => outcome)
                .increment(1);
        }
    }

    /// Runs one adjustment round immediately and returns the decision.
    pub fn adjust_now(&self) -> Adjustment {
        self.inner.adjust()
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Stops the monitor task and releases the transport's idle connections.
    ///
    /// Safe to call any number of times.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.stop_monitor();
        // Dropping the last handle closes every idle connection; exchanges
        // still in flight keep their own clone until they finish.
        self.inner
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        lock(&self.inner.stats).idle_connections = 0;

        #[cfg(feature = "tracing")]
        tracing::debug!(pool = %self.inner.name, "connection pool closed");

        self.inner.listeners.emit(&PoolEvent::Closed {
            pattern_name: self.inner.name.clone(),
            timestamp: Instant::now(),
        });
    }

    fn start_monitor(&self, interval: Duration) -> Result<(), PoolError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PoolError::NoRuntime)?;
        let weak = Arc::downgrade(&self.inner);
        let task = runtime.spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if inner.closed.load(Ordering::Acquire) {
                    break;
                }
                inner.adjust();
            }
        });
        *lock(&self.inner.monitor) = Some(task);
        Ok(())
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("name", &self.inner.name)
            .field("config", &self.config())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl PoolInner {
    fn build_transport(&self, config: &PoolConfig) -> Result<reqwest::Client, reqwest::Error> {
        // HTTP/2 is negotiated through ALPN and the connector races IPv6 and
        // IPv4 addresses, so neither needs explicit configuration here.
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(config.idle_timeout)
            .connect_timeout(config.connect_timeout())
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true);
        if let Some(customize) = &self.customize {
            builder = customize(builder);
        }
        builder.build()
    }

    fn adjust(&self) -> Adjustment {
        if self.closed.load(Ordering::Acquire) {
            return Adjustment::Hold;
        }

        let active = lock(&self.stats).active_connections;
        let mut config = lock(&self.config);
        let decision = plan_adjustment(&config, active);

        match decision {
            Adjustment::Grow {
                from,
                to,
                utilization,
            }
            | Adjustment::Shrink {
                from,
                to,
                utilization,
            } => {
                let mut next = config.clone();
                next.max_idle_per_host = to;
                let transport = match self.build_transport(&next) {
                    Ok(transport) => transport,
                    Err(_err) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(pool = %self.name, error = %_err, "failed to rebuild transport, keeping current ceiling");
                        return Adjustment::Hold;
                    }
                };

                {
                    let mut slot = self.transport.write().unwrap_or_else(PoisonError::into_inner);
                    if slot.is_none() {
                        // Closed while we were planning.
                        return Adjustment::Hold;
                    }
                    *slot = Some(transport);
                }
                *config = next;
                drop(config);

                {
                    let mut stats = lock(&self.stats);
                    stats.last_adjustment_time = Some(Instant::now());
                    stats.adjustments += 1;
                    stats.idle_connections = stats.idle_connections.min(to);
                }

                #[cfg(feature = "tracing")]
                tracing::info!(pool = %self.name, from, to, utilization, "rescaled idle connection ceiling");

                #[cfg(feature = "metrics")]
                {
                    gauge!("courier_pool_max_idle_per_host", "pool" => self.name.clone())
                        .set(to as f64);
                    counter!("courier_pool_adjustments_total", "pool" => self.name.clone())
                        .increment(1);
                }

                self.listeners.emit(&PoolEvent::Resized {
                    pattern_name: self.name.clone(),
                    timestamp: Instant::now(),
                    from,
                    to,
                    utilization,
                });
            }
            Adjustment::Rejected {
                current,
                proposed,
                utilization,
            } => {
                drop(config);

                #[cfg(feature = "tracing")]
                tracing::debug!(pool = %self.name, current, proposed, utilization, "resize proposal out of bounds");

                self.listeners.emit(&PoolEvent::ResizeRejected {
                    pattern_name: self.name.clone(),
                    timestamp: Instant::now(),
                    current,
                    proposed,
                    utilization,
                });
            }
            Adjustment::Hold => {}
        }

        decision
    }

    fn stop_monitor(&self) {
        if let Some(task) = lock(&self.monitor).take() {
            task.abort();
        }
    }

    fn release(&self) {
        let mut stats = lock(&self.stats);
        stats.active_connections = stats.active_connections.saturating_sub(1);
        if !self.closed.load(Ordering::Acquire) {
            let ceiling = lock(&self.config).max_idle_per_host;
            stats.idle_connections = (stats.idle_connections + 1).min(ceiling);
        }
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        self.stop_monitor();
    }
}

/// Keeps one exchange counted as an active connection.
///
/// Returned by [`ConnectionPool::track`]; dropping it moves the connection
/// back to the idle count.
#[must_use = "the connection is released as soon as the guard is dropped"]
pub struct ConnectionGuard {
    pool: Weak<PoolInner>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.upgrade() {
            pool.release();
        }
    }
}

impl fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionGuard").finish_non_exhaustive()
    }
}

/// Builder for [`ConnectionPool`].
pub struct ConnectionPoolBuilder {
    config: PoolConfig,
    name: String,
    customize: Option<Arc<TransportCustomizer>>,
    listeners: EventListeners<PoolEvent>,
}

impl Default for ConnectionPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionPoolBuilder {
    /// Creates a builder with [`PoolConfig::default`] and name `"<unnamed>"`.
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
            name: "<unnamed>".to_string(),
            customize: None,
            listeners: EventListeners::new(),
        }
    }

    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the name used in events, logs and metric labels.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Applies extra transport settings (TLS roots, proxies, default headers,
    /// compression) every time the transport is built or rebuilt.
    pub fn configure_transport<F>(mut self, f: F) -> Self
    where
        F: Fn(reqwest::ClientBuilder) -> reqwest::ClientBuilder + Send + Sync + 'static,
    {
        self.customize = Some(Arc::new(f));
        self
    }

    /// Registers a callback for applied resizes, with the old and new ceiling.
    pub fn on_resized<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &PoolEvent| {
            if let PoolEvent::Resized { from, to, .. } = event {
                f(*from, *to);
            }
        }));
        self
    }

    /// Registers a listener for every pool event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&PoolEvent) + Send + Sync + 'static,
    {
        self.listeners.on(f);
        self
    }

    /// Validates the configuration, builds the transport and, when adaptive
    /// scaling is enabled, starts the monitor task.
    pub fn build(self) -> Result<ConnectionPool, PoolError> {
        self.config.validate()?;

        let adaptive = self.config.adaptive_enabled;
        let interval = self.config.adjustment_interval;
        let max_idle = self.config.max_idle_per_host;

        let inner = PoolInner {
            name: self.name,
            config: Mutex::new(self.config),
            stats: Mutex::new(ConnectionStats::default()),
            transport: RwLock::new(None),
            customize: self.customize,
            monitor: Mutex::new(None),
            listeners: self.listeners,
            closed: AtomicBool::new(false),
        };
        let transport = inner
            .build_transport(&lock(&inner.config))
            .map_err(PoolError::Transport)?;
        *inner.transport.write().unwrap_or_else(PoisonError::into_inner) = Some(transport);

        let pool = ConnectionPool {
            inner: Arc::new(inner),
        };

        #[cfg(feature = "metrics")]
        gauge!("courier_pool_max_idle_per_host", "pool" => pool.inner.name.clone())
            .set(max_idle as f64);

        #[cfg(feature = "tracing")]
        tracing::debug!(pool = %pool.inner.name, max_idle, adaptive, "connection pool created");

        #[cfg(not(any(feature = "metrics", feature = "tracing")))]
        let _ = max_idle;

        if adaptive {
            pool.start_monitor(interval)?;
        }
        Ok(pool)
    }
}
