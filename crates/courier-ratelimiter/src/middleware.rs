use crate::limiter::RateLimiter;
use courier_core::{BoxFuture, Flow, HttpError, Middleware, Request, RequestContext};

/// Holds every request until the limiter hands out a token.
///
/// A closed limiter rejects the request with an
/// [`ErrorKind::RateLimit`](courier_core::ErrorKind::RateLimit) error.
#[derive(Debug, Clone)]
pub struct RateLimitMiddleware {
    limiter: RateLimiter,
}

impl RateLimitMiddleware {
    pub fn new(limiter: RateLimiter) -> Self {
        Self { limiter }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

impl Middleware for RateLimitMiddleware {
    fn name(&self) -> &str {
        "rate_limit"
    }

    fn before_request<'a>(
        &'a self,
        _request: &'a mut Request,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Flow, HttpError>> {
        Box::pin(async move {
            self.limiter.acquire().await?;
            Ok(Flow::Continue)
        })
    }
}
