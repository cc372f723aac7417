//! Request descriptors.

use bytes::Bytes;
use courier_core::header::{HeaderName, HeaderValue};
use courier_core::{HttpError, Method, Middleware, MiddlewareStack, Phase, Request, SharedMiddleware, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Everything needed to perform one logical request.
///
/// A `RequestSpec` is a plain description: nothing is parsed or validated
/// until the engine builds the outbound request, so header and URL mistakes
/// surface as [`Validation`](courier_core::ErrorKind::Validation) errors with
/// phase [`Build`](Phase::Build). A fresh request is built for every attempt.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    middlewares: MiddlewareStack,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
            deadline: None,
            middlewares: MiddlewareStack::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::HEAD, url)
    }

    /// Adds a header. Repeated names are appended, not replaced.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Bounds each attempt. Takes precedence over [`deadline`](Self::deadline)
    /// and the session default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// An absolute point in time after which the request is abandoned,
    /// typically inherited from a caller's own budget.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Appends a middleware that only applies to this request. Request
    /// middlewares run after the session's.
    pub fn with_middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.add_middleware(middleware);
        self
    }

    pub fn add_middleware<M>(&mut self, middleware: M)
    where
        M: Middleware + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Replaces every request-scoped middleware.
    pub fn set_middlewares(&mut self, middlewares: Vec<SharedMiddleware>) {
        self.middlewares.set(middlewares);
    }

    pub fn clear_middlewares(&mut self) {
        self.middlewares.clear();
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn middlewares(&self) -> &MiddlewareStack {
        &self.middlewares
    }

    pub(crate) fn timeout_value(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn deadline_value(&self) -> Option<Instant> {
        self.deadline
    }

    /// Builds the outbound request.
    pub(crate) fn build(&self) -> Result<Request, HttpError> {
        let url = Url::parse(&self.url).map_err(|err| {
            HttpError::validation(format!("invalid url {:?}", self.url))
                .with_phase(Phase::Build)
                .with_source(err)
        })?;

        let mut request = Request::new(self.method.clone(), url);
        let headers = request.headers_mut();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                HttpError::validation(format!("invalid header name {:?}", name))
                    .with_phase(Phase::Build)
                    .with_source(err)
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|err| {
                HttpError::validation(format!("invalid value for header {}", name))
                    .with_phase(Phase::Build)
                    .with_source(err)
            })?;
            headers.append(header_name, header_value);
        }

        if let Some(body) = &self.body {
            *request.body_mut() = Some(body.clone().into());
        }
        Ok(request)
    }
}
