//! The request execution engine.
//!
//! One call to [`execute`] performs a logical request:
//!
//! 1. build the outbound request from the [`RequestSpec`]
//! 2. run the before-hooks in insertion order
//! 3. send the request through the pool's transport under the deadline
//! 4. read the body and run the after-hooks in reverse order
//!
//! and repeats the whole sequence for as long as a middleware asks for a
//! retry. Build errors end the request immediately.

use crate::request::RequestSpec;
use courier_core::{
    BeforeOutcome, HttpError, HttpResponse, MiddlewareStack, Phase, Request, RequestContext,
    UnwindGuard,
};
use courier_pool::ConnectionPool;
use std::time::Duration;
use tokio::time::Instant;

/// Runs `spec` through `stack` until no middleware requests another attempt.
pub(crate) async fn execute(
    pool: &ConnectionPool,
    stack: &MiddlewareStack,
    spec: &RequestSpec,
    default_timeout: Option<Duration>,
) -> Result<HttpResponse, HttpError> {
    let mut attempt = 1;
    loop {
        let request = spec.build()?;
        let ctx = RequestContext::new(request.method().clone(), request.url().clone(), attempt);
        let deadline = attempt_deadline(spec, default_timeout);

        let outcome = run_attempt(pool, stack, request, &ctx, deadline).await;

        let Some(delay) = stack.retry_delay(attempt, outcome.as_ref(), &ctx) else {
            return outcome;
        };
        let Some(delay) = bounded_retry_delay(delay, spec, default_timeout) else {
            tracing::debug!(
                method = %ctx.method(),
                url = %ctx.url(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retry skipped, the wait outlasts the request's time budget"
            );
            return outcome;
        };
        tracing::debug!(
            method = %ctx.method(),
            url = %ctx.url(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            "retrying request"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// An explicit timeout beats an inherited deadline, which beats the session
/// default.
/// default. A timeout too large to represent as an instant imposes no bound.
fn attempt_deadline(spec: &RequestSpec, default_timeout: Option<Duration>) -> Option<Instant> {
    let now = Instant::now();
    match spec.timeout_value() {
        Some(timeout) => now.checked_add(timeout),
        None => spec
            .deadline_value()
            .or_else(|| default_timeout.and_then(|timeout| now.checked_add(timeout))),
    }
}

/// Returns `delay` if the next attempt could still finish in time.
///
/// With a deadline the wait has to end before it. With a per-attempt
/// timeout (explicit, or the session default when no deadline is set) the
/// wait has to be shorter than the timeout itself.
fn bounded_retry_delay(
    delay: Duration,
    spec: &RequestSpec,
    default_timeout: Option<Duration>,
) -> Option<Duration> {
    let deadline = spec.deadline_value();
    if let Some(limit) = deadline {
        match Instant::now().checked_add(delay) {
            Some(resume_at) if resume_at < limit => {}
            _ => return None,
        }
    }

    let timeout = match deadline {
        Some(_) => spec.timeout_value(),
        None => spec.timeout_value().or(default_timeout),
    };
    match timeout {
        Some(timeout) if delay >= timeout => None,
        _ => Some(delay),
    }
}

async fn run_attempt(
    pool: &ConnectionPool,
    stack: &MiddlewareStack,
    mut request: Request,
    ctx: &RequestContext,
    deadline: Option<Instant>,
) -> Result<HttpResponse, HttpError> {
    let entered = match stack.run_before(&mut request, ctx).await {
        BeforeOutcome::Proceed => stack.len(),
        BeforeOutcome::Respond { entered, response } => {
            stack.run_after(entered, &response, ctx).await?;
            return Ok(response);
        }
        BeforeOutcome::Failed { entered, error } => {
            stack.notify_error(entered, &error, ctx);
            return Err(error);
        }
    };

    let mut guard = UnwindGuard::new(stack, ctx);
    guard.set_entered(entered);
    let result = send(pool, request, deadline).await;
    guard.disarm();

    let response = match result {
        Ok(response) => response,
        Err(error) => {
            stack.notify_error(entered, &error, ctx);
            return Err(error);
        }
    };

    stack.run_after(entered, &response, ctx).await?;
    Ok(response)
}

/// Performs one HTTP round trip and reads the whole body.
async fn send(
    pool: &ConnectionPool,
    request: Request,
    deadline: Option<Instant>,
) -> Result<HttpResponse, HttpError> {
    let client = pool
        .client()
        .map_err(|err| HttpError::from(err).with_phase(Phase::Transport))?;
    let _connection = pool.track();
    let started = Instant::now();

    let exchange = async {
        let response = client
            .execute(request)
            .await
            .map_err(HttpError::from_transport)?;
        let time_to_headers = started.elapsed();

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await.map_err(HttpError::from_transport)?;

        let response =
            HttpResponse::new(status, headers, body, url).with_elapsed(started.elapsed());
        Ok::<_, HttpError>((response, time_to_headers))
    };

    let result = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, exchange).await {
            Ok(result) => result,
            Err(_) => {
                Err(HttpError::timeout("request deadline elapsed").with_phase(Phase::Transport))
            }
        },
        None => exchange.await,
    };

    match result {
        Ok((response, time_to_headers)) => {
            pool.record_request(true, time_to_headers);
            Ok(response)
        }
        Err(error) => {
            pool.record_request(false, started.elapsed());
            Err(error)
        }
    }
}
