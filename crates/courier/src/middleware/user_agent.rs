use courier_core::header::USER_AGENT;
use courier_core::{
    BoxFuture, Flow, HeaderValue, HttpError, Middleware, Request, RequestContext,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Sets `User-Agent` to the next value of a fixed list, round robin.
///
/// Clones share the rotation position. An empty list leaves requests
/// untouched.
#[derive(Debug, Clone)]
pub struct UserAgentRotation {
    agents: Arc<[HeaderValue]>,
    next: Arc<AtomicUsize>,
}

impl UserAgentRotation {
    /// Fails with a [`Validation`](courier_core::ErrorKind::Validation) error
    /// if any agent is not a valid header value.
    pub fn new<I, S>(agents: I) -> Result<Self, HttpError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let agents = agents
            .into_iter()
            .map(|agent| {
                let agent = agent.as_ref();
                HeaderValue::from_str(agent).map_err(|err| {
                    HttpError::validation(format!("invalid user agent {:?}", agent))
                        .with_source(err)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            agents: agents.into(),
            next: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    fn next_agent(&self) -> Option<&HeaderValue> {
        if self.agents.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        self.agents.get(index)
    }
}

impl Middleware for UserAgentRotation {
    fn name(&self) -> &str {
        "user_agent_rotation"
    }

    fn before_request<'a>(
        &'a self,
        request: &'a mut Request,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Flow, HttpError>> {
        Box::pin(async move {
            if let Some(agent) = self.next_agent() {
                request.headers_mut().insert(USER_AGENT, agent.clone());
            }
            Ok(Flow::Continue)
        })
    }
}
