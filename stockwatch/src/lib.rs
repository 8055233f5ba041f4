//! Stockwatch - watchlist data-aggregation engine.
//!
//! # Modules
//! - [`data`]: domain types, the provider trait, the Finnhub adapter and the
//!   per-symbol series cache
//! - [`watchlist`]: persisted watchlist over a key-value store, with change events
//! - [`aggregate`]: change calculator, batch coordinator and detail loader
//! - [`search`]: cancellable deferred task and the search debouncer
//! - [`format`]: display strings for prices, percentages and metrics

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod aggregate;
pub mod data;
pub mod format;
pub mod search;
pub mod watchlist;

pub use aggregate::{
    ChangeDirection, DetailLoader, StockDetail, WatchlistCoordinator, WatchlistRow,
    WatchlistUpdate,
};
pub use data::{
    FetchError, FetchErrorKind, FinnhubClient, MarketDataProvider, Metrics, NewsKind, NewsStory,
    PricePoint, SearchResult, SeriesCache, Symbol, TimeSeries,
};
pub use search::{DebounceState, DeferredTask, SearchDebouncer};
pub use watchlist::{
    KeyValueStore, MemoryKvStore, SqliteKvStore, WatchlistEntry, WatchlistEvent, WatchlistStore,
};
