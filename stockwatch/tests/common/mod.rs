//! Shared test doubles.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use stockwatch::{
    FetchError, MarketDataProvider, MemoryKvStore, Metrics, NewsKind, NewsStory, PricePoint,
    SearchResult, Symbol, TimeSeries, WatchlistStore,
};

/// Provider with scripted per-symbol outcomes and call counters.
#[derive(Default)]
pub struct ScriptedProvider {
    series: Mutex<HashMap<String, Result<TimeSeries, FetchError>>>,
    metrics: Mutex<HashMap<String, Result<Metrics, FetchError>>>,
    searches: Mutex<HashMap<String, Result<Vec<SearchResult>, FetchError>>>,
    news: Mutex<Option<Result<Vec<NewsStory>, FetchError>>>,
    latency: Option<Duration>,
    pub market_calls: AtomicU32,
    pub metric_calls: AtomicU32,
    pub news_calls: AtomicU32,
    pub search_calls: AtomicU32,
    pub search_log: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `latency` first.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_series(self, symbol: &str, outcome: Result<TimeSeries, FetchError>) -> Self {
        self.series
            .lock()
            .unwrap()
            .insert(symbol.to_string(), outcome);
        self
    }

    pub fn with_metrics(self, symbol: &str, outcome: Result<Metrics, FetchError>) -> Self {
        self.metrics
            .lock()
            .unwrap()
            .insert(symbol.to_string(), outcome);
        self
    }

    pub fn with_search(self, query: &str, outcome: Result<Vec<SearchResult>, FetchError>) -> Self {
        self.searches
            .lock()
            .unwrap()
            .insert(query.to_string(), outcome);
        self
    }

    pub fn with_news(self, outcome: Result<Vec<NewsStory>, FetchError>) -> Self {
        *self.news.lock().unwrap() = Some(outcome);
        self
    }

    pub fn market_calls(&self) -> u32 {
        self.market_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> u32 {
        self.search_calls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn market_data(&self, symbol: &Symbol, _days: u32) -> Result<TimeSeries, FetchError> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.series
            .lock()
            .unwrap()
            .get(symbol.as_str())
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Transport("unscripted symbol".into())))
    }

    async fn metrics(&self, symbol: &Symbol) -> Result<Metrics, FetchError> {
        self.metric_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.metrics
            .lock()
            .unwrap()
            .get(symbol.as_str())
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Transport("unscripted symbol".into())))
    }

    async fn news(&self, _kind: &NewsKind) -> Result<Vec<NewsStory>, FetchError> {
        self.news_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.news
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, FetchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_log.lock().unwrap().push(query.to_string());
        self.delay().await;
        self.searches
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn sym(s: &str) -> Symbol {
    Symbol::parse(s).unwrap()
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

pub fn point(timestamp: DateTime<Utc>, close: f64) -> PricePoint {
    PricePoint {
        timestamp,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000.0,
    }
}

/// Newest-first series with one point per day, `closes[0]` being the newest.
pub fn daily_series(closes: &[f64]) -> TimeSeries {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| point(at(20 - i as u32, 12), close))
        .collect()
}

pub fn search_hit(symbol: &str, description: &str) -> SearchResult {
    SearchResult {
        symbol: symbol.to_string(),
        display_symbol: symbol.to_string(),
        description: description.to_string(),
        kind: "Common Stock".to_string(),
    }
}

/// In-memory store seeded with `defaults`.
pub fn memory_store(defaults: &[(&str, &str)]) -> Arc<WatchlistStore> {
    let defaults: std::collections::BTreeMap<String, String> = defaults
        .iter()
        .map(|(s, n)| (s.to_string(), n.to_string()))
        .collect();
    Arc::new(WatchlistStore::open(Arc::new(MemoryKvStore::new()), &defaults).unwrap())
}
