mod breaker;
mod builtins;
mod cache;
mod errors;
mod ordering;
mod ratelimit;
mod retry;

/// Shared middlewares and helpers.
pub(crate) mod helpers {
    use courier::core::{BoxFuture, Request};
    use courier::{Flow, HttpError, HttpResponse, Middleware, RequestContext};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Shared log of hook invocations, such as `"before:a"`.
    pub(crate) type HookLog = Arc<Mutex<Vec<String>>>;

    pub(crate) fn hook_log() -> HookLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub(crate) fn entries(log: &HookLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    /// Records every hook call. Can be told to fail either hook.
    pub(crate) struct Recorder {
        pub(crate) name: &'static str,
        pub(crate) log: HookLog,
        pub(crate) fail_before: Option<HttpError>,
        pub(crate) fail_after: bool,
    }

    impl Recorder {
        pub(crate) fn new(name: &'static str, log: &HookLog) -> Self {
            Self {
                name,
                log: Arc::clone(log),
                fail_before: None,
                fail_after: false,
            }
        }

        fn push(&self, hook: &str) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", hook, self.name));
        }
    }

    impl Middleware for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn before_request<'a>(
            &'a self,
            _request: &'a mut Request,
            _ctx: &'a RequestContext,
        ) -> BoxFuture<'a, Result<Flow, HttpError>> {
            Box::pin(async move {
                self.push("before");
                match &self.fail_before {
                    Some(error) => Err(HttpError::new(error.kind(), error.message())),
                    None => Ok(Flow::Continue),
                }
            })
        }

        fn after_response<'a>(
            &'a self,
            _response: &'a HttpResponse,
            _ctx: &'a RequestContext,
        ) -> BoxFuture<'a, Result<(), HttpError>> {
            Box::pin(async move {
                self.push("after");
                if self.fail_after {
                    Err(HttpError::internal("response rejected"))
                } else {
                    Ok(())
                }
            })
        }

        fn on_error(&self, _error: &HttpError, _ctx: &RequestContext) {
            self.push("error");
        }
    }

    /// Counts before-hook calls, i.e. attempts that reached this point of
    /// the pipeline.
    #[derive(Clone, Default)]
    pub(crate) struct AttemptCounter(pub(crate) Arc<AtomicUsize>);

    impl AttemptCounter {
        pub(crate) fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl Middleware for AttemptCounter {
        fn name(&self) -> &str {
            "attempt_counter"
        }

        fn before_request<'a>(
            &'a self,
            _request: &'a mut Request,
            _ctx: &'a RequestContext,
        ) -> BoxFuture<'a, Result<Flow, HttpError>> {
            Box::pin(async move {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(Flow::Continue)
            })
        }
    }

    /// An address nothing listens on.
    pub(crate) const UNREACHABLE: &str = "http://127.0.0.1:1/";
}
