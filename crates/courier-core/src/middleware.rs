//! The middleware contract and the ordered stack that runs it.
//!
//! A [`Middleware`] wraps a single exchange with up to four hooks:
//!
//! - [`before_request`](Middleware::before_request) may mutate the outbound
//!   request, reject it with an error, or answer it directly (cache hit).
//! - [`after_response`](Middleware::after_response) observes the received
//!   response and may reject it.
//! - [`on_error`](Middleware::on_error) observes an exchange that was
//!   admitted by this middleware but failed later on.
//! - [`retry_after`](Middleware::retry_after) asks the engine to run the
//!   whole pipeline again after a delay.
//!
//! Hook order is the onion order: before-hooks run in insertion order,
//! after-hooks and error notifications run in reverse insertion order, and
//! only for middlewares whose before-hook let the request through.

use crate::context::RequestContext;
use crate::error::{HttpError, Phase};
use crate::response::HttpResponse;
use futures::future::BoxFuture;
use reqwest::Request;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// What a before-hook wants the pipeline to do next.
#[derive(Debug)]
pub enum Flow {
    /// Hand the request to the next middleware (or the network).
    Continue,
    /// Skip the rest of the pipeline and answer with this response.
    Respond(HttpResponse),
}

/// The result of one attempt, as seen by [`Middleware::retry_after`].
pub type Outcome<'a> = Result<&'a HttpResponse, &'a HttpError>;

/// A cross-cutting behavior wrapped around every exchange.
pub trait Middleware: Send + Sync {
    /// Name used in error messages and logs.
    fn name(&self) -> &str;

    /// Runs before the network call.
    fn before_request<'a>(
        &'a self,
        _request: &'a mut Request,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Flow, HttpError>> {
        Box::pin(async { Ok(Flow::Continue) })
    }

    /// Runs after a response was received.
    fn after_response<'a>(
        &'a self,
        _response: &'a HttpResponse,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<(), HttpError>> {
        Box::pin(async { Ok(()) })
    }

    /// Called when an exchange this middleware admitted did not reach its
    /// `after_response` hook, including when the caller dropped the request
    /// (the error kind is then `Cancelled`).
    fn on_error(&self, _error: &HttpError, _ctx: &RequestContext) {}

    /// Returns a delay if the pipeline should run again for this request.
    fn retry_after(
        &self,
        _attempt: u32,
        _outcome: Outcome<'_>,
        _ctx: &RequestContext,
    ) -> Option<Duration> {
        None
    }
}

/// A middleware shared between sessions, requests and tasks.
pub type SharedMiddleware = Arc<dyn Middleware>;

/// Result of running the before-hooks of a stack.
#[derive(Debug)]
pub enum BeforeOutcome {
    /// Every before-hook let the request through.
    Proceed,
    /// The middleware at index `entered` answered the request itself.
    Respond {
        entered: usize,
        response: HttpResponse,
    },
    /// The middleware at index `entered` rejected the request.
    Failed { entered: usize, error: HttpError },
}

/// An ordered collection of middlewares.
#[derive(Clone, Default)]
pub struct MiddlewareStack {
    items: Vec<SharedMiddleware>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware.
    pub fn push(&mut self, middleware: SharedMiddleware) {
        self.items.push(middleware);
    }

    /// Replaces the whole stack.
    pub fn set(&mut self, middlewares: Vec<SharedMiddleware>) {
        self.items = middlewares;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedMiddleware> {
        self.items.iter()
    }

    /// Returns `self` followed by `other`.
    pub fn concat(&self, other: &MiddlewareStack) -> MiddlewareStack {
        let mut items = Vec::with_capacity(self.items.len() + other.items.len());
        items.extend(self.items.iter().cloned());
        items.extend(other.items.iter().cloned());
        MiddlewareStack { items }
    }

    /// Runs before-hooks in insertion order, stopping at the first one that
    /// does not continue.
    pub async fn run_before(&self, request: &mut Request, ctx: &RequestContext) -> BeforeOutcome {
        let mut guard = UnwindGuard::new(self, ctx);
        for (index, middleware) in self.items.iter().enumerate() {
            guard.set_entered(index);
            match middleware.before_request(request, ctx).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Respond(response)) => {
                    guard.disarm();
                    return BeforeOutcome::Respond {
                        entered: index,
                        response,
                    };
                }
                Err(error) => {
                    guard.disarm();
                    let error = HttpError::wrap(
                        Phase::BeforeRequest,
                        format!("middleware before-request failed ({})", middleware.name()),
                        error,
                    );
                    return BeforeOutcome::Failed {
                        entered: index,
                        error,
                    };
                }
            }
        }
        guard.disarm();
        BeforeOutcome::Proceed
    }

    /// Runs the after-hooks of the first `entered` middlewares in reverse
    /// order.
    ///
    /// On failure the middlewares that were not reached yet receive
    /// [`Middleware::on_error`]; hooks that already ran are not rolled back.
    pub async fn run_after(
        &self,
        entered: usize,
        response: &HttpResponse,
        ctx: &RequestContext,
    ) -> Result<(), HttpError> {
        let entered = entered.min(self.items.len());
        let mut guard = UnwindGuard::new(self, ctx);
        for index in (0..entered).rev() {
            guard.set_entered(index);
            let middleware = &self.items[index];
            if let Err(error) = middleware.after_response(response, ctx).await {
                guard.disarm();
                let error = HttpError::wrap(
                    Phase::AfterResponse,
                    format!("middleware after-response failed ({})", middleware.name()),
                    error,
                );
                self.notify_error(index, &error, ctx);
                return Err(error);
            }
        }
        guard.disarm();
        Ok(())
    }

    /// Tells the first `entered` middlewares, in reverse order, that the
    /// exchange failed.
    pub fn notify_error(&self, entered: usize, error: &HttpError, ctx: &RequestContext) {
        let entered = entered.min(self.items.len());
        for middleware in self.items[..entered].iter().rev() {
            middleware.on_error(error, ctx);
        }
    }

    /// Returns the first retry delay requested by any middleware.
    pub fn retry_delay(
        &self,
        attempt: u32,
        outcome: Outcome<'_>,
        ctx: &RequestContext,
    ) -> Option<Duration> {
        self.items
            .iter()
            .find_map(|m| m.retry_after(attempt, outcome, ctx))
    }
}

/// Notifies the entered middlewares if an exchange is dropped half way.
///
/// While armed, dropping the guard calls [`Middleware::on_error`] on the
/// first `entered` middlewares with an [`ErrorKind::Cancelled`] error, so
/// admissions they hold (a half-open trial, an in-flight counter) are given
/// back when the caller abandons the request future.
///
/// [`ErrorKind::Cancelled`]: crate::ErrorKind::Cancelled
#[must_use = "the guard notifies middlewares when it is dropped"]
pub struct UnwindGuard<'a> {
    stack: &'a MiddlewareStack,
    ctx: &'a RequestContext,
    entered: usize,
    armed: bool,
}

impl<'a> UnwindGuard<'a> {
    /// Creates an armed guard with no middleware entered yet.
    pub fn new(stack: &'a MiddlewareStack, ctx: &'a RequestContext) -> Self {
        Self {
            stack,
            ctx,
            entered: 0,
            armed: true,
        }
    }

    /// Sets how many middlewares, counted from the front, get notified.
    pub fn set_entered(&mut self, entered: usize) {
        self.entered = entered;
    }

    /// The exchange finished normally; nothing is notified on drop.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.entered > 0 {
            let error = HttpError::cancelled("request dropped before completion");
            self.stack.notify_error(self.entered, &error, self.ctx);
        }
    }
}

impl fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.items.iter().map(|m| m.name()))
            .finish()
    }
}

impl FromIterator<SharedMiddleware> for MiddlewareStack {
    fn from_iter<I: IntoIterator<Item = SharedMiddleware>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
