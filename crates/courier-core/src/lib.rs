//! Core infrastructure for courier.
//!
//! This crate provides the pieces every other courier crate builds on:
//! - [`HttpError`] and the [`ErrorKind`] taxonomy
//! - the [`Middleware`] contract and the ordered [`MiddlewareStack`]
//! - [`HttpResponse`], the normalized response value
//! - an event system for observability

pub mod context;
pub mod error;
pub mod events;
pub mod middleware;
pub mod response;

pub use context::RequestContext;
pub use error::{BoxError, ErrorKind, HttpError, Phase, Result};
pub use events::{CourierEvent, EventListener, EventListeners, FnListener};
pub use middleware::{
    BeforeOutcome, Flow, Middleware, MiddlewareStack, Outcome, SharedMiddleware, UnwindGuard,
};
pub use response::HttpResponse;

// Re-exported so middleware implementors do not need a direct dependency.
pub use futures::future::BoxFuture;
pub use reqwest::header::{self, HeaderMap, HeaderValue};
pub use reqwest::{Method, Request, StatusCode, Url};
