//! Watchlist persistence and change notifications.
//!
//! The [`WatchlistStore`] is the source of truth for which symbols are
//! aggregated. It sits on a [`KeyValueStore`] and publishes a
//! [`WatchlistEvent`] on every mutation.

mod kv;
mod store;

pub use kv::{KeyValueStore, MemoryKvStore, SqliteKvStore};
pub use store::WatchlistStore;

use serde::{Deserialize, Serialize};

use crate::data::Symbol;

/// One persisted watchlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub symbol: Symbol,
    pub display_name: String,
}

/// Mutation notification, delivered once per subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchlistEvent {
    Added { symbol: Symbol },
    Removed { symbol: Symbol },
}
