//! Market data module.
//!
//! Domain types shared by the fetchers, the series cache and the
//! aggregation layer, plus the provider abstraction and its Finnhub adapter.
//!
//! # Ordering
//! A [`TimeSeries`] is always newest-first, exactly as the provider reports
//! it once the adapter has reversed the wire columns. The change calculator
//! relies on this and never re-sorts.

mod cache;
mod finnhub;
mod provider;

pub use cache::{CacheStats, SeriesCache};
pub use finnhub::FinnhubClient;
pub use provider::{FetchError, FetchErrorKind, MarketDataProvider};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use stockwatch_common::Error;

// ============================================================================
// Symbol
// ============================================================================

/// Uppercase ticker identifier.
///
/// Deserialization goes through [`Symbol::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse a ticker, trimming whitespace and uppercasing.
    pub fn parse(raw: &str) -> stockwatch_common::Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("symbol must not be blank".into()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(Error::InvalidInput(format!(
                "symbol '{}' must not contain whitespace",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Time series
// ============================================================================

/// One price sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Price history for one symbol, newest first. Empty means "no data".
pub type TimeSeries = Vec<PricePoint>;

// ============================================================================
// Metrics
// ============================================================================

/// Fundamental metrics. Each field is absent when the provider omits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    pub week52_return: Option<f64>,
    pub beta: Option<f64>,
    pub ten_day_avg_volume: Option<f64>,
}

// ============================================================================
// News
// ============================================================================

/// Which news feed to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsKind {
    /// General market headlines
    TopStories,
    /// Trailing-window company news for one symbol
    Company(Symbol),
}

/// A single news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsStory {
    pub id: i64,
    pub category: String,
    pub published_at: DateTime<Utc>,
    pub headline: String,
    pub image: String,
    pub related: String,
    pub source: String,
    pub summary: String,
    pub url: String,
}

// ============================================================================
// Search
// ============================================================================

/// One symbol-search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub symbol: String,
    pub display_symbol: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}
