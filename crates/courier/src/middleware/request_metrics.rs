use courier_core::{
    BoxFuture, Flow, HttpError, HttpResponse, Middleware, Request, RequestContext,
};
#[cfg(feature = "metrics")]
use metrics::{counter, gauge, histogram};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Point-in-time copy of the counters kept by [`MetricsMiddleware`].
///
/// Every attempt counts separately, so a request retried twice adds three
/// to `requests_started`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub requests_started: u64,
    /// Attempts answered with any status.
    pub responses: u64,
    /// Attempts that ended without a response.
    pub failures: u64,
    pub in_flight: u64,
    pub cache_hits: u64,
    pub latency_samples: u64,
    pub latency_total_ms: u64,
    pub latency_avg_ms: f64,
    pub status_counts: BTreeMap<u16, u64>,
    /// Failures by error kind.
    pub error_counts: BTreeMap<String, u64>,
}

#[derive(Debug, Default)]
struct Counters {
    requests_started: AtomicU64,
    responses: AtomicU64,
    failures: AtomicU64,
    in_flight: AtomicU64,
    cache_hits: AtomicU64,
    latency_samples: AtomicU64,
    latency_total_ms: AtomicU64,
    status_counts: Mutex<BTreeMap<u16, u64>>,
    error_counts: Mutex<BTreeMap<String, u64>>,
}

/// Counts requests, statuses, failures and latency.
///
/// The counters live in the process and are read with
/// [`snapshot`](Self::snapshot). With the `metrics` feature the same
/// observations are also reported through the `metrics` facade as
/// `courier_requests_total`, `courier_request_failures_total`,
/// `courier_request_duration_seconds` and `courier_requests_in_flight`.
///
/// Clones share their counters, so a clone can be kept for reading after
/// the middleware was handed to a session.
#[derive(Debug, Clone, Default)]
pub struct MetricsMiddleware {
    counters: Arc<Counters>,
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.counters;
        let latency_samples = c.latency_samples.load(Ordering::Relaxed);
        let latency_total_ms = c.latency_total_ms.load(Ordering::Relaxed);
        let latency_avg_ms = if latency_samples == 0 {
            0.0
        } else {
            latency_total_ms as f64 / latency_samples as f64
        };

        MetricsSnapshot {
            requests_started: c.requests_started.load(Ordering::Relaxed),
            responses: c.responses.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
            in_flight: c.in_flight.load(Ordering::Relaxed),
            cache_hits: c.cache_hits.load(Ordering::Relaxed),
            latency_samples,
            latency_total_ms,
            latency_avg_ms,
            status_counts: c
                .status_counts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            error_counts: c
                .error_counts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    /// Zeroes every counter except `in_flight`.
    pub fn reset(&self) {
        let c = &self.counters;
        c.requests_started.store(0, Ordering::Relaxed);
        c.responses.store(0, Ordering::Relaxed);
        c.failures.store(0, Ordering::Relaxed);
        c.cache_hits.store(0, Ordering::Relaxed);
        c.latency_samples.store(0, Ordering::Relaxed);
        c.latency_total_ms.store(0, Ordering::Relaxed);
        c.status_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        c.error_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn leave_in_flight(&self) {
        let _ = self
            .counters
            .in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));

        #[cfg(feature = "metrics")]
        gauge!("courier_requests_in_flight").decrement(1.0);
    }

    fn record_latency(&self, elapsed: Duration) {
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.counters.latency_samples.fetch_add(1, Ordering::Relaxed);
        self.counters
            .latency_total_ms
            .fetch_add(millis, Ordering::Relaxed);
    }
}

impl Middleware for MetricsMiddleware {
    fn name(&self) -> &str {
        "metrics"
    }

    fn before_request<'a>(
        &'a self,
        _request: &'a mut Request,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Flow, HttpError>> {
        Box::pin(async move {
            self.counters.requests_started.fetch_add(1, Ordering::Relaxed);
            self.counters.in_flight.fetch_add(1, Ordering::Relaxed);

            #[cfg(feature = "metrics")]
            gauge!("courier_requests_in_flight").increment(1.0);

            Ok(Flow::Continue)
        })
    }

    fn after_response<'a>(
        &'a self,
        response: &'a HttpResponse,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<(), HttpError>> {
        Box::pin(async move {
            let elapsed = ctx.elapsed();
            let status = response.status().as_u16();

            self.leave_in_flight();
            self.counters.responses.fetch_add(1, Ordering::Relaxed);
            if response.is_from_cache() {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            }
            self.record_latency(elapsed);
            *self
                .counters
                .status_counts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(status)
                .or_insert(0) += 1;

            #[cfg(feature = "metrics")]
            {
                counter!(
                    "courier_requests_total",
                    "method" => ctx.method().to_string(),
                    "status" => status.to_string()
                )
                .increment(1);
                histogram!("courier_request_duration_seconds", "method" => ctx.method().to_string())
                    .record(elapsed.as_secs_f64());
            }

            Ok(())
        })
    }

    fn on_error(&self, error: &HttpError, ctx: &RequestContext) {
        self.leave_in_flight();
        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        self.record_latency(ctx.elapsed());
        *self
            .counters
            .error_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(error.kind().as_str().to_string())
            .or_insert(0) += 1;

        #[cfg(feature = "metrics")]
        counter!(
            "courier_request_failures_total",
            "method" => ctx.method().to_string(),
            "kind" => error.kind().as_str()
        )
        .increment(1);
    }
}
