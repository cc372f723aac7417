//! [`tower::Service`] adapter for [`Session`].

use crate::request::RequestSpec;
use crate::session::Session;
use courier_core::{BoxFuture, HttpError, HttpResponse};
use std::task::{Context, Poll};
use tower::Service;

/// Lets Tower layers (buffers, load shedding, timeouts) wrap the whole
/// middleware pipeline. The session is always ready; admission control
/// belongs to its middlewares.
impl Service<RequestSpec> for Session {
    type Response = HttpResponse;
    type Error = HttpError;
    type Future = BoxFuture<'static, Result<HttpResponse, HttpError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, spec: RequestSpec) -> Self::Future {
        let session = self.clone();
        Box::pin(async move { session.execute(spec).await })
    }
}
