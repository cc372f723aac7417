use courier_core::header::HeaderName;
use courier_core::{
    BoxFuture, Flow, HeaderValue, HttpError, Middleware, Request, RequestContext,
};
use std::sync::Arc;
use uuid::Uuid;

/// Header used by [`RequestIdMiddleware`] unless configured otherwise.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Tags every request with a unique identifier.
///
/// A random UUID v4 is generated for requests that do not carry the header
/// yet. Every attempt is built afresh, so retries get a new identifier
/// unless the caller set the header on the request.
#[derive(Clone)]
pub struct RequestIdMiddleware {
    header: HeaderName,
    generate: IdGenerator,
}

impl RequestIdMiddleware {
    pub fn new() -> Self {
        Self {
            header: HeaderName::from_static(REQUEST_ID_HEADER),
            generate: Arc::new(|| Uuid::new_v4().to_string()),
        }
    }

    /// Uses another header name, such as `x-correlation-id`.
    pub fn header(mut self, header: HeaderName) -> Self {
        self.header = header;
        self
    }

    /// Replaces the UUID generator.
    pub fn generator<F>(mut self, f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.generate = Arc::new(f);
        self
    }
}

impl Default for RequestIdMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &str {
        "request_id"
    }

    fn before_request<'a>(
        &'a self,
        request: &'a mut Request,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Flow, HttpError>> {
        Box::pin(async move {
            if request.headers().contains_key(&self.header) {
                return Ok(Flow::Continue);
            }
            let id = (self.generate)();
            let value = HeaderValue::from_str(&id).map_err(|err| {
                HttpError::validation(format!("generated request id {:?} is not a header value", id))
                    .with_source(err)
            })?;
            request.headers_mut().insert(self.header.clone(), value);
            Ok(Flow::Continue)
        })
    }
}

impl std::fmt::Debug for RequestIdMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestIdMiddleware")
            .field("header", &self.header)
            .finish()
    }
}
