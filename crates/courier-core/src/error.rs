//! Error taxonomy shared by every courier component.
//!
//! All failures surfaced by the execution pipeline are an [`HttpError`]. An
//! error carries a [`ErrorKind`] (what went wrong), a [`Phase`] (where in the
//! pipeline it happened), an optional HTTP status code, and an optional
//! wrapped cause for diagnostic chaining.
//!
//! ```rust
//! use courier_core::{ErrorKind, HttpError};
//!
//! let err = HttpError::new(ErrorKind::Internal, "upstream misbehaved").with_status(503);
//!
//! // Status-code checks match even though the kind was set generically.
//! assert!(err.is_server_error());
//! assert!(!err.is_kind(ErrorKind::ServerError));
//! ```

use std::error::Error as StdError;
use std::fmt;

/// Boxed error used as the wrapped cause of an [`HttpError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection refused, DNS failure, reset, or other transport failure.
    Network,
    /// A deadline elapsed before the exchange completed.
    Timeout,
    /// The server refused the credentials (401/403) or auth injection failed.
    Auth,
    /// A local or remote rate limit rejected the call.
    RateLimit,
    /// The server answered with a 5xx status.
    ServerError,
    /// The server answered with a 4xx status.
    ClientError,
    /// The request could not be built from its description.
    Validation,
    /// A body could not be encoded or decoded.
    Serialization,
    /// The server answered with an unfollowed redirect.
    Redirect,
    /// The circuit breaker rejected the call without reaching the network.
    CircuitOpen,
    /// The caller dropped the request before it completed.
    Cancelled,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Returns a stable lowercase label, suitable for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Auth => "auth",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ServerError => "server_error",
            ErrorKind::ClientError => "client_error",
            ErrorKind::Validation => "validation",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Redirect => "redirect",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Turning the request description into a transport request.
    Build,
    /// A middleware `before_request` hook.
    BeforeRequest,
    /// The network round trip itself.
    Transport,
    /// A middleware `after_response` hook.
    AfterResponse,
    /// Classification of a received response (see `HttpResponse::error_for_status`).
    Response,
}

/// A classified failure from the courier pipeline.
pub struct HttpError {
    kind: ErrorKind,
    phase: Option<Phase>,
    status: Option<u16>,
    message: String,
    source: Option<BoxError>,
}

impl HttpError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            phase: None,
            status: None,
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`ErrorKind::Network`] error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// Shorthand for a [`ErrorKind::Timeout`] error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Shorthand for a [`ErrorKind::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Shorthand for a [`ErrorKind::Cancelled`] error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Shorthand for a [`ErrorKind::Internal`] error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Builds the error a response with `status` maps to.
    ///
    /// 401/403 map to `Auth`, 429 to `RateLimit`, 3xx to `Redirect`, other
    /// 4xx to `ClientError` and 5xx to `ServerError`.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => ErrorKind::Auth,
            429 => ErrorKind::RateLimit,
            300..=399 => ErrorKind::Redirect,
            400..=499 => ErrorKind::ClientError,
            500..=599 => ErrorKind::ServerError,
            _ => ErrorKind::Internal,
        };
        Self::new(kind, message)
            .with_status(status)
            .with_phase(Phase::Response)
    }

    /// Classifies a transport error returned by `reqwest`.
    pub fn from_transport(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_builder() {
            ErrorKind::Validation
        } else if err.is_redirect() {
            ErrorKind::Redirect
        } else if err.is_decode() || err.is_body() {
            ErrorKind::Serialization
        } else {
            ErrorKind::Network
        };
        let message = match kind {
            ErrorKind::Timeout => "request timed out",
            ErrorKind::Validation => "invalid request",
            ErrorKind::Redirect => "redirect failed",
            ErrorKind::Serialization => "failed to read response body",
            _ => "network request failed",
        };
        let status = err.status().map(|s| s.as_u16());
        let mut error = Self::new(kind, message)
            .with_phase(Phase::Transport)
            .with_source(err);
        error.status = status;
        error
    }

    /// Wraps `cause` as the failure of a pipeline stage.
    ///
    /// The kind and status of the cause are preserved so that, for example,
    /// a rate-limit rejection inside a before-hook is still a `RateLimit`
    /// error.
    pub fn wrap(phase: Phase, message: impl Into<String>, cause: HttpError) -> Self {
        Self {
            kind: cause.kind,
            phase: Some(phase),
            status: cause.status,
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// Sets the HTTP status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the pipeline phase.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Sets the wrapped cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.source = Some(source.into());
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the pipeline phase, if known.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// Returns the HTTP status code, if any.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the human readable message without the cause.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the error was declared with `kind`.
    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// Returns true for `ServerError` or any 5xx status.
    pub fn is_server_error(&self) -> bool {
        self.kind == ErrorKind::ServerError || matches!(self.status, Some(500..=599))
    }

    /// Returns true for `ClientError` or any 4xx status.
    pub fn is_client_error(&self) -> bool {
        self.kind == ErrorKind::ClientError || matches!(self.status, Some(400..=499))
    }

    /// Returns true if a deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    /// Returns true for failures that are usually transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::RateLimit
        ) || self.is_server_error()
    }
}

impl fmt::Debug for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("HttpError");
        s.field("kind", &self.kind);
        if let Some(phase) = self.phase {
            s.field("phase", &phase);
        }
        if let Some(status) = self.status {
            s.field("status", &status);
        }
        s.field("message", &self.message);
        if let Some(source) = &self.source {
            s.field("source", source);
        }
        s.finish()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl StdError for HttpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        Self::from_transport(err)
    }
}

/// Result alias used throughout courier.
pub type Result<T> = std::result::Result<T, HttpError>;
