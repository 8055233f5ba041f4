//! Watchlist aggregation coordinator.
//!
//! One coordinator owns one [`SeriesCache`]. A batch:
//! 1. de-duplicates the requested entries (first occurrence wins)
//! 2. skips symbols with a live cache entry
//! 3. fetches the rest concurrently, bounded by `max_concurrent_fetches`
//! 4. after every fetch has settled, writes successes into the cache and
//!    builds the row list exactly once
//!
//! Failed fetches are logged and leave no cache entry; the batch never
//! aborts. [`WatchlistCoordinator::run`] serializes batches inside a single
//! task, so an earlier batch can never publish after a later one.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use stockwatch_common::config::AggregationConfig;
use stockwatch_common::Result;

use super::WatchlistRow;
use crate::data::{FetchError, MarketDataProvider, SeriesCache, Symbol, TimeSeries};
use crate::watchlist::{WatchlistEntry, WatchlistEvent, WatchlistStore};

/// Per-batch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Distinct symbols in the batch
    pub requested: usize,
    /// Served from cache without a network call
    pub cached: usize,
    /// Network fetches issued
    pub fetched: usize,
    /// Fetches that failed
    pub failed: usize,
}

/// Result of one batch.
#[derive(Debug, Clone)]
pub struct WatchlistUpdate {
    /// Monotonic batch counter, starting at 1
    pub generation: u64,
    /// Rows sorted by company name
    pub rows: Vec<WatchlistRow>,
    pub stats: BatchStats,
}

/// Drop repeated symbols, keeping the first occurrence.
pub(crate) fn dedup_entries(entries: &[WatchlistEntry]) -> Vec<WatchlistEntry> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .iter()
        .filter(|e| seen.insert(e.symbol.clone()))
        .cloned()
        .collect()
}

/// Fan-out/join aggregator with an owned series cache.
pub struct WatchlistCoordinator {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<WatchlistStore>,
    cache: SeriesCache,
    history_days: u32,
    max_concurrent: usize,
    generation: u64,
}

impl WatchlistCoordinator {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<WatchlistStore>,
        config: &AggregationConfig,
    ) -> Self {
        Self {
            provider,
            store,
            cache: SeriesCache::with_ttl(config.cache_ttl_secs.map(Duration::from_secs)),
            history_days: config.history_days,
            max_concurrent: config.max_concurrent_fetches.max(1),
            generation: 0,
        }
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    /// Generation of the most recently completed batch (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Aggregate the current watchlist.
    pub async fn refresh(&mut self) -> Result<WatchlistUpdate> {
        let entries = self.store.list_symbols()?;
        Ok(self.aggregate(&entries).await)
    }

    /// Run one batch over `entries`.
    pub async fn aggregate(&mut self, entries: &[WatchlistEntry]) -> WatchlistUpdate {
        let entries = dedup_entries(entries);
        self.cache.clear_expired();

        // Expiry is judged once, at batch start
        let as_of = Instant::now();
        let misses: Vec<Symbol> = entries
            .iter()
            .filter(|e| !self.cache.contains_as_of(&e.symbol, as_of))
            .map(|e| e.symbol.clone())
            .collect();

        let mut stats = BatchStats {
            requested: entries.len(),
            cached: entries.len() - misses.len(),
            fetched: misses.len(),
            failed: 0,
        };

        let results = self.fetch_all(misses).await;

        // Join point: every fetch has settled
        for (symbol, result) in results {
            match result {
                Ok(series) => {
                    debug!(symbol = %symbol, points = series.len(), "Fetched market data");
                    self.cache.insert(symbol, series);
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(
                        provider = self.provider.name(),
                        symbol = %symbol,
                        kind = %e.kind(),
                        error = %e,
                        "Market data fetch failed"
                    );
                }
            }
        }

        self.publish(&entries, stats, as_of)
    }

    /// Fetch every symbol concurrently; order of results is unspecified.
    async fn fetch_all(&self, symbols: Vec<Symbol>) -> Vec<(Symbol, std::result::Result<TimeSeries, FetchError>)> {
        let days = self.history_days;
        stream::iter(symbols.into_iter().map(|symbol| {
            let provider = Arc::clone(&self.provider);
            async move {
                let result = provider.market_data(&symbol, days).await;
                (symbol, result)
            }
        }))
        .buffer_unordered(self.max_concurrent)
        .collect()
        .await
    }

    /// Drop one symbol from the cache and rebuild rows without fetching.
    pub fn evict_and_rebuild(&mut self, symbol: &Symbol) -> Result<WatchlistUpdate> {
        self.cache.evict(symbol);
        let entries = dedup_entries(&self.store.list_symbols()?);
        let as_of = Instant::now();
        let stats = BatchStats {
            requested: entries.len(),
            cached: entries
                .iter()
                .filter(|e| self.cache.contains_as_of(&e.symbol, as_of))
                .count(),
            ..BatchStats::default()
        };
        Ok(self.publish(&entries, stats, as_of))
    }

    fn publish(
        &mut self,
        entries: &[WatchlistEntry],
        stats: BatchStats,
        as_of: Instant,
    ) -> WatchlistUpdate {
        self.generation += 1;
        let rows = self.build_rows(entries, as_of);

        info!(
            generation = self.generation,
            rows = rows.len(),
            requested = stats.requested,
            cached = stats.cached,
            fetched = stats.fetched,
            failed = stats.failed,
            "Watchlist batch complete"
        );

        WatchlistUpdate {
            generation: self.generation,
            rows,
            stats,
        }
    }

    /// One row per entry with data live at `as_of`, sorted by company name.
    fn build_rows(&self, entries: &[WatchlistEntry], as_of: Instant) -> Vec<WatchlistRow> {
        let mut rows: Vec<WatchlistRow> = entries
            .iter()
            .filter_map(|entry| {
                self.cache
                    .get_as_of(&entry.symbol, as_of)
                    .map(|series| WatchlistRow::from_series(entry, series))
            })
            .collect();

        rows.sort_by(|a, b| {
            a.company_name
                .cmp(&b.company_name)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        rows
    }

    async fn refresh_logged(&mut self) -> Option<WatchlistUpdate> {
        match self.refresh().await {
            Ok(update) => Some(update),
            Err(e) => {
                error!(error = %e, "Failed to read watchlist");
                None
            }
        }
    }

    /// Event loop: initial batch, then one batch per watchlist event.
    ///
    /// Returns when the event channel closes or `updates` is dropped.
    pub async fn run(
        mut self,
        mut events: broadcast::Receiver<WatchlistEvent>,
        updates: mpsc::Sender<WatchlistUpdate>,
    ) {
        if let Some(update) = self.refresh_logged().await {
            if updates.send(update).await.is_err() {
                return;
            }
        }

        loop {
            let update = match events.recv().await {
                Ok(WatchlistEvent::Added { symbol }) => {
                    debug!(symbol = %symbol, "Watchlist grew, clearing cache");
                    self.cache.clear();
                    self.refresh_logged().await
                }
                Ok(WatchlistEvent::Removed { symbol }) => match self.evict_and_rebuild(&symbol) {
                    Ok(update) => Some(update),
                    Err(e) => {
                        error!(symbol = %symbol, error = %e, "Failed to rebuild watchlist");
                        None
                    }
                },
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Missed watchlist events, running full refresh");
                    self.cache.clear();
                    self.refresh_logged().await
                }
                Err(RecvError::Closed) => break,
            };

            if let Some(update) = update {
                if updates.send(update).await.is_err() {
                    break;
                }
            }
        }

        debug!("Watchlist coordinator stopped");
    }
}
