use courier_core::{
    BoxFuture, Flow, HttpError, HttpResponse, Middleware, Request, RequestContext,
};
use std::time::Duration;

/// Logs every exchange with structured `tracing` fields.
///
/// Requests are logged at `DEBUG` when sent and at `INFO` when answered.
/// Error statuses, failed exchanges and answers slower than the configured
/// threshold are logged at `WARN`.
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    slow_threshold: Option<Duration>,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs responses that took longer than `threshold` at `WARN`.
    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    fn is_slow(&self, elapsed: Duration) -> bool {
        self.slow_threshold.is_some_and(|limit| elapsed > limit)
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    fn before_request<'a>(
        &'a self,
        _request: &'a mut Request,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Flow, HttpError>> {
        Box::pin(async move {
            tracing::debug!(
                method = %ctx.method(),
                url = %ctx.url(),
                attempt = ctx.attempt(),
                "sending request"
            );
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
            let elapsed_ms = elapsed.as_millis() as u64;
            let status = response.status().as_u16();
            let cached = response.is_from_cache();

            if response.status().is_client_error() || response.status().is_server_error() {
                tracing::warn!(
                    method = %ctx.method(),
                    url = %ctx.url(),
                    status,
                    elapsed_ms,
                    attempt = ctx.attempt(),
                    "request returned an error status"
                );
            } else if self.is_slow(elapsed) {
                tracing::warn!(
                    method = %ctx.method(),
                    url = %ctx.url(),
                    status,
                    elapsed_ms,
                    attempt = ctx.attempt(),
                    "slow response"
                );
            } else {
                tracing::info!(
                    method = %ctx.method(),
                    url = %ctx.url(),
                    status,
                    elapsed_ms,
                    attempt = ctx.attempt(),
                    cached,
                    "request completed"
                );
            }
            Ok(())
        })
    }

    fn on_error(&self, error: &HttpError, ctx: &RequestContext) {
        tracing::warn!(
            method = %ctx.method(),
            url = %ctx.url(),
            kind = %error.kind(),
            elapsed_ms = ctx.elapsed().as_millis() as u64,
            attempt = ctx.attempt(),
            error = %error,
            "request failed"
        );
    }
}
