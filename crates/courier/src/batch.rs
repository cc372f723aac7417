//! Bounded concurrent execution of many requests.

use crate::request::RequestSpec;
use crate::session::Session;
use courier_core::{HttpError, HttpResponse};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Runs a set of requests through one session with at most
/// `max_concurrency` in flight.
///
/// Results are returned in insertion order, one per request, whether it
/// succeeded or not.
///
/// # Examples
///
/// ```rust,no_run
/// use courier::{BatchRunner, Session};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::new()?;
/// let mut batch = BatchRunner::new(session.clone(), 4);
/// for id in 0..20 {
///     batch.add(session.get(format!("https://api.example.com/items/{}", id)));
/// }
/// let results = batch
///     .on_progress(|done, total| println!("{}/{}", done, total))
///     .execute()
///     .await;
/// assert_eq!(results.len(), 20);
/// # Ok(())
/// # }
/// ```
pub struct BatchRunner {
    session: Session,
    max_concurrency: usize,
    requests: Vec<RequestSpec>,
    on_progress: Option<ProgressFn>,
}

impl BatchRunner {
    /// A `max_concurrency` of zero is treated as one.
    pub fn new(session: Session, max_concurrency: usize) -> Self {
        Self {
            session,
            max_concurrency: max_concurrency.max(1),
            requests: Vec::new(),
            on_progress: None,
        }
    }

    pub fn add(&mut self, spec: RequestSpec) -> &mut Self {
        self.requests.push(spec);
        self
    }

    /// Called once per finished request with `(completed, total)`.
    pub fn on_progress<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(f));
        self
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Runs every queued request and waits for all of them.
    ///
    /// The queue is drained, so the runner can be filled and executed again.
    pub async fn execute(&mut self) -> Vec<Result<HttpResponse, HttpError>> {
        let requests = std::mem::take(&mut self.requests);
        let total = requests.len();
        if total == 0 {
            return Vec::new();
        }

        let gate = Arc::new(Semaphore::new(self.max_concurrency));
        let (tx, mut rx) = mpsc::channel(total);

        tracing::debug!(total, max_concurrency = self.max_concurrency, "batch started");

        for (index, spec) in requests.into_iter().enumerate() {
            let session = self.session.clone();
            let gate = Arc::clone(&gate);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = match gate.acquire_owned().await {
                    Ok(_permit) => session.execute(spec).await,
                    Err(_) => Err(HttpError::internal("batch admission gate closed")),
                };
                // The receiver only goes away if the batch future was dropped.
                let _ = tx.send((index, result)).await;
            });
        }
        drop(tx);

        let mut slots: Vec<Option<Result<HttpResponse, HttpError>>> =
            (0..total).map(|_| None).collect();
        let mut completed = 0;
        while let Some((index, result)) = rx.recv().await {
            if let Err(error) = &result {
                tracing::debug!(index, error = %error, "batch request failed");
            }
            slots[index] = Some(result);
            completed += 1;
            if let Some(progress) = &self.on_progress {
                progress(completed, total);
            }
        }

        tracing::debug!(total, completed, "batch finished");

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| Err(HttpError::internal("batch request task was aborted")))
            })
            .collect()
    }
}

impl fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchRunner")
            .field("max_concurrency", &self.max_concurrency)
            .field("queued", &self.requests.len())
            .finish()
    }
}
