//! Per-search state shared by every site and page worker
//!
//! One context is built per search. It bounds the number of fetches in
//! flight across all sites with a single semaphore and carries the
//! cancellation token that the search deadline trips.

use crate::listings::fetcher::{Fetch, PageDocument};
use crate::FetchError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// What came back from a bounded, cancellable fetch
#[derive(Debug)]
pub enum FetchOutcome {
    Document(PageDocument),
    Failed(FetchError),
    /// The search was cancelled before the fetch completed
    Cancelled,
}

/// Handles cloned into every spawned worker
#[derive(Clone)]
pub struct ScrapeContext {
    fetcher: Arc<dyn Fetch>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl ScrapeContext {
    pub fn new(fetcher: Arc<dyn Fetch>, max_concurrent_fetches: usize, cancel: CancellationToken) -> Self {
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(max_concurrent_fetches.max(1))),
            cancel,
        }
    }

    /// Fetches a page once a fetch slot is free
    ///
    /// The permit is held only for this one fetch, so nested site and page
    /// fan-out can never wait on each other. Cancellation wins over both the
    /// permit wait and the fetch itself.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => FetchOutcome::Cancelled,
            result = self.fetch_with_permit(url) => match result {
                Ok(document) => FetchOutcome::Document(document),
                Err(error) => FetchOutcome::Failed(error),
            },
        }
    }

    async fn fetch_with_permit(&self, url: &str) -> Result<PageDocument, FetchError> {
        // The semaphore is never closed, so acquire cannot fail.
        let _permit = self.permits.acquire().await.ok();
        self.fetcher.fetch(url).await
    }
}

impl std::fmt::Debug for ScrapeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeContext")
            .field("available_permits", &self.permits.available_permits())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
