//! Debounced customer search.
//!
//! Keystrokes are fed in with [`CustomerSearch::set_query`]. A fetch is only
//! issued once the query has been quiet for the configured period, and fetches
//! run concurrently, so a slow response for an old query can arrive after the
//! response for a newer one. Results pass through [`Sequenced`], which drops
//! the stale one.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use honor_loyalty_core::Customer;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::LoyaltyClient;
use crate::error::ApiError;
use crate::lists::Sequenced;

const LOAD_FAILED: &str = "Failed to load customers";

/// What the search currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// Query the customers were fetched for.
    pub query: String,
    pub customers: Vec<Customer>,
    /// Set when the latest fetch failed. The previous customers are kept.
    pub error: Option<String>,
    /// Whether any fetch has completed.
    pub loaded: bool,
}

/// A running debounced search.
///
/// The background task stops when this is dropped.
#[derive(Debug)]
pub struct CustomerSearch {
    query: watch::Sender<String>,
    results: watch::Receiver<SearchResults>,
    task: JoinHandle<()>,
}

impl CustomerSearch {
    /// Search customers through `client`. The initial (blank) query is
    /// fetched once the first quiet period passes.
    #[must_use]
    pub fn spawn(client: LoyaltyClient, debounce: Duration) -> Self {
        Self::with_fetcher(debounce, move |query: String| {
            let client = client.clone();
            async move { client.list_customers(Some(&query)).await }
        })
    }

    /// Search with an arbitrary fetch function.
    pub fn with_fetcher<F, Fut>(debounce: Duration, fetch: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Customer>, ApiError>> + Send + 'static,
    {
        let (query_tx, query_rx) = watch::channel(String::new());
        let (results_tx, results_rx) = watch::channel(SearchResults::default());
        let task = tokio::spawn(run(debounce, query_rx, results_tx, Arc::new(fetch)));

        Self {
            query: query_tx,
            results: results_rx,
            task,
        }
    }

    /// Replace the query. Restarts the quiet period.
    pub fn set_query(&self, query: impl Into<String>) {
        self.query.send_replace(query.into());
    }

    /// Latest results.
    #[must_use]
    pub fn results(&self) -> SearchResults {
        self.results.borrow().clone()
    }

    /// Receiver notified whenever the results change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchResults> {
        self.results.clone()
    }
}

impl Drop for CustomerSearch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<F, Fut>(
    debounce: Duration,
    mut queries: watch::Receiver<String>,
    results: watch::Sender<SearchResults>,
    fetch: Arc<F>,
) where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Customer>, ApiError>> + Send + 'static,
{
    let list = Arc::new(Mutex::new(Sequenced::new(Vec::<Customer>::new())));
    let results = Arc::new(results);
    let mut first = true;

    loop {
        if !first && queries.changed().await.is_err() {
            return;
        }
        first = false;

        // Quiet period: every change restarts it
        loop {
            match tokio::time::timeout(debounce, queries.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => return,
                Err(_) => break,
            }
        }

        let query = queries.borrow_and_update().clone();
        let ticket = list.lock().unwrap_or_else(PoisonError::into_inner).begin();
        tracing::debug!(query = %query, "Searching customers");

        let request = fetch(query.clone());
        let list = Arc::clone(&list);
        let results = Arc::clone(&results);
        tokio::spawn(async move {
            match request.await {
                Ok(customers) => {
                    let mut list = list.lock().unwrap_or_else(PoisonError::into_inner);
                    if list.apply(ticket, customers) {
                        results.send_replace(SearchResults {
                            query,
                            customers: list.get().clone(),
                            error: None,
                            loaded: true,
                        });
                    }
                }
                Err(e) => {
                    let mut list = list.lock().unwrap_or_else(PoisonError::into_inner);
                    if list.fail(ticket) {
                        tracing::warn!(query = %query, error = %e, "Customer search failed");
                        let message = e.user_message(LOAD_FAILED);
                        results.send_modify(|current| current.error = Some(message));
                    }
                }
            }
        });
    }
}
