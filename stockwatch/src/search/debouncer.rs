//! Debounced symbol search.
//!
//! Two states: Idle and Pending. Each query change cancels the pending
//! timer and starts a new one; when a timer fires exactly one search is
//! issued for that query. Blank queries clear the results without a call,
//! and a failed search clears them too.
//!
//! Results are published on a `watch` channel. A result is only published
//! if no newer query arrived while the search was in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use stockwatch_common::config::SearchConfig;

use super::DeferredTask;
use crate::data::{MarketDataProvider, SearchResult};

/// Debouncer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending,
}

/// Keystroke-driven search with a quiet period.
pub struct SearchDebouncer {
    provider: Arc<dyn MarketDataProvider>,
    delay: Duration,
    pending: Option<DeferredTask>,
    generation: Arc<AtomicU64>,
    results: Arc<watch::Sender<Vec<SearchResult>>>,
}

impl SearchDebouncer {
    pub fn new(provider: Arc<dyn MarketDataProvider>, delay: Duration) -> Self {
        let (results, _) = watch::channel(Vec::new());
        Self {
            provider,
            delay,
            pending: None,
            generation: Arc::new(AtomicU64::new(0)),
            results: Arc::new(results),
        }
    }

    pub fn from_config(provider: Arc<dyn MarketDataProvider>, config: &SearchConfig) -> Self {
        Self::new(provider, Duration::from_millis(config.debounce_ms))
    }

    /// Receiver for the current result list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<SearchResult>> {
        self.results.subscribe()
    }

    pub fn state(&self) -> DebounceState {
        match &self.pending {
            Some(task) if task.is_pending() => DebounceState::Pending,
            _ => DebounceState::Idle,
        }
    }

    /// Cancel any pending search.
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
    }

    /// Handle a change of the query text.
    pub fn query_changed(&mut self, text: &str) {
        self.cancel();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let query = text.trim().to_string();
        if query.is_empty() {
            self.results.send_replace(Vec::new());
            return;
        }

        let provider = Arc::clone(&self.provider);
        let current = Arc::clone(&self.generation);
        let results = Arc::clone(&self.results);

        self.pending = Some(DeferredTask::schedule(self.delay, async move {
            let found = match provider.search(&query).await {
                Ok(found) => {
                    debug!(query = %query, hits = found.len(), "Search complete");
                    found
                }
                Err(e) => {
                    warn!(provider = provider.name(), query = %query, kind = %e.kind(), error = %e, "Search failed");
                    Vec::new()
                }
            };

            if current.load(Ordering::SeqCst) == generation {
                results.send_replace(found);
            } else {
                debug!(query = %query, "Discarding superseded search results");
            }
        }));
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
