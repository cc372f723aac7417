use crate::breaker::CircuitBreaker;
use courier_core::{
    BoxFuture, ErrorKind, Flow, HttpError, HttpResponse, Middleware, Phase, Request,
    RequestContext,
};

/// The breaker guards the exchange from its before-hook and learns the
/// outcome from its after-hook (status >= 500 is a failure) or from
/// [`Middleware::on_error`] (transport failures and timeouts are failures;
/// an exchange abandoned before the network frees the trial slot without
/// counting, and so does a dropped request or a response served from a
/// cache further down the stack).
impl Middleware for CircuitBreaker {
    fn name(&self) -> &str {
        "circuit_breaker"
    }

    fn before_request<'a>(
        &'a self,
        _request: &'a mut Request,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Flow, HttpError>> {
        Box::pin(async move {
            self.try_acquire()?;
            Ok(Flow::Continue)
        })
    }

    fn after_response<'a>(
        &'a self,
        response: &'a HttpResponse,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<(), HttpError>> {
        Box::pin(async move {
            if response.is_from_cache() {
                // Answered below the breaker; upstream health is unknown.
                self.release();
            } else {
                self.record_status(response.status().as_u16());
            }
            Ok(())
        })
    }

    fn on_error(&self, error: &HttpError, _ctx: &RequestContext) {
        if error.is_kind(ErrorKind::Cancelled) {
            self.release();
            return;
        }
        match error.phase() {
            Some(Phase::Transport) => self.record_failure(),
            Some(Phase::AfterResponse) if error.is_server_error() => self.record_failure(),
            _ => self.release(),
        }
    }
}
