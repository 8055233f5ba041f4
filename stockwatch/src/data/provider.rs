//! Data provider abstraction.
//!
//! Defines the `MarketDataProvider` trait implemented by the HTTP adapter
//! and by test doubles. Every operation makes a single attempt; callers own
//! any retry policy and the cache.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use super::{Metrics, NewsKind, NewsStory, SearchResult, Symbol, TimeSeries};

// ============================================================================
// Fetch Error
// ============================================================================

/// Failure of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be built (bad URL, blank query)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Connectivity, timeout or non-success HTTP status
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Success status with no body
    #[error("Empty response")]
    EmptyResponse,

    /// Body did not match the expected schema
    #[error("Decode failure: {0}")]
    Decode(String),
}

/// Discriminant of [`FetchError`], used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    InvalidRequest,
    Transport,
    EmptyResponse,
    Decode,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Transport => "transport",
            Self::EmptyResponse => "empty_response",
            Self::Decode => "decode",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::InvalidRequest(_) => FetchErrorKind::InvalidRequest,
            Self::Transport(_) => FetchErrorKind::Transport,
            Self::EmptyResponse => FetchErrorKind::EmptyResponse,
            Self::Decode(_) => FetchErrorKind::Decode,
        }
    }

    /// Classify a reqwest send/read failure.
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport("Request timeout".into())
        } else if err.is_connect() {
            Self::Transport("Connection failed".into())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Source of market data, metrics, news and symbol search.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider name for logging (e.g. "finnhub")
    fn name(&self) -> &'static str;

    /// Fetch the trailing `days` of price history, newest first.
    async fn market_data(&self, symbol: &Symbol, days: u32) -> Result<TimeSeries, FetchError>;

    /// Fetch fundamental metrics for a symbol.
    async fn metrics(&self, symbol: &Symbol) -> Result<Metrics, FetchError>;

    /// Fetch top stories or a symbol's company news.
    async fn news(&self, kind: &NewsKind) -> Result<Vec<NewsStory>, FetchError>;

    /// Search symbols matching free text.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, FetchError>;
}
