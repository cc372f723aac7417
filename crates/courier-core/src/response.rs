//! Normalized response returned by the execution engine.

use crate::error::HttpError;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// A fully received HTTP response.
///
/// The body has already been read and decompressed, so the value is cheap to
/// clone and can be stored by caching middleware.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: Url,
    elapsed: Duration,
    from_cache: bool,
}

impl HttpResponse {
    /// Creates a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>, url: Url) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            url,
            elapsed: Duration::ZERO,
            from_cache: false,
        }
    }

    /// Sets how long the exchange took.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Marks the response as served from a cache.
    pub fn into_cached(mut self) -> Self {
        self.from_cache = true;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The final URL of the exchange.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns true if a cache middleware answered instead of the network.
    pub fn is_from_cache(&self) -> bool {
        self.from_cache
    }

    /// Returns the value of a header as a string, if present and valid.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the response unchanged for 2xx statuses, or the classified error.
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        if self.status.is_success() || self.status.is_informational() {
            return Ok(self);
        }
        let message = format!(
            "{} {} returned {}",
            self.url.host_str().unwrap_or_default(),
            self.url.path(),
            self.status
        );
        Err(HttpError::from_status(self.status.as_u16(), message))
    }
}
