//! Per-symbol series cache.
//!
//! Owned by a single coordinator and mutated through `&mut self` only, so it
//! needs no interior locking. Entries live until evicted or cleared unless a
//! TTL is configured, in which case expired entries behave as misses.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::{Symbol, TimeSeries};

/// Cache entry with its insertion time
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    stored_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            stored_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        self.is_expired_at(ttl, Instant::now())
    }

    fn is_expired_at(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.saturating_duration_since(self.stored_at) >= ttl)
    }
}

/// Market data cache keyed by symbol
#[derive(Debug, Default)]
pub struct SeriesCache {
    entries: HashMap<Symbol, CacheEntry<TimeSeries>>,
    ttl: Option<Duration>,
}

impl SeriesCache {
    /// Create a cache without expiry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with an optional TTL
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Get a cached series if present and not expired
    pub fn get(&self, symbol: &Symbol) -> Option<&TimeSeries> {
        self.get_as_of(symbol, Instant::now())
    }

    /// Get a cached series judging expiry at `as_of` instead of now.
    ///
    /// Entries stored after `as_of` are always live.
    pub fn get_as_of(&self, symbol: &Symbol, as_of: Instant) -> Option<&TimeSeries> {
        self.entries
            .get(symbol)
            .filter(|entry| !entry.is_expired_at(self.ttl, as_of))
            .map(|entry| &entry.data)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.get(symbol).is_some()
    }

    pub fn contains_as_of(&self, symbol: &Symbol, as_of: Instant) -> bool {
        self.get_as_of(symbol, as_of).is_some()
    }

    pub fn insert(&mut self, symbol: Symbol, series: TimeSeries) {
        self.entries.insert(symbol, CacheEntry::new(series));
    }

    /// Remove one symbol; returns whether it was present
    pub fn evict(&mut self, symbol: &Symbol) -> bool {
        self.entries.remove(symbol).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop all expired entries
    pub fn clear_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| !entry.is_expired(ttl));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let total = self.entries.len();
        let expired = self
            .entries
            .values()
            .filter(|e| e.is_expired(self.ttl))
            .count();

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

// ============================================================================
// Tests
// ============================================================================
