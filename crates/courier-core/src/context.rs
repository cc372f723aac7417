//! Per-exchange context handed to every middleware hook.

use reqwest::{Method, Url};
use std::time::{Duration, Instant};

/// Read-only facts about the exchange currently flowing through the pipeline.
///
/// A fresh context is created for every attempt, so `started_at` measures
/// the current attempt only.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    url: Url,
    attempt: u32,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for attempt number `attempt` (starting at 1).
    pub fn new(method: Method, url: Url, attempt: u32) -> Self {
        Self {
            method,
            url,
            attempt,
            started_at: Instant::now(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The attempt number, 1 for the first try.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time spent in this attempt so far.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
