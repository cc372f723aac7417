use courier_core::{ErrorKind, HttpError};

/// Errors that can occur when using the rate limiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimiterError {
    /// The configured rate was zero or above one billion per second.
    #[error("rate must be between 1 and 1000000000 requests per second")]
    InvalidRate,
    /// The refill task needs a Tokio runtime.
    #[error("rate limiter requires a running Tokio runtime")]
    NoRuntime,
    /// No token was available for a non-blocking acquisition.
    #[error("rate limit exceeded")]
    RateLimitExceeded,
    /// The limiter was closed, possibly while the caller was waiting.
    #[error("rate limiter is closed")]
    Closed,
}

impl From<RateLimiterError> for HttpError {
    fn from(err: RateLimiterError) -> Self {
        let (kind, message) = match err {
            RateLimiterError::RateLimitExceeded | RateLimiterError::Closed => {
                (ErrorKind::RateLimit, "call rejected")
            }
            RateLimiterError::InvalidRate | RateLimiterError::NoRuntime => {
                (ErrorKind::Internal, "rate limiter unavailable")
            }
        };
        HttpError::new(kind, message).with_source(err)
    }
}
