//! Finnhub REST adapter.
//!
//! # Endpoints
//! - `stock/candle`: price history, epoch-second window
//! - `stock/metric`: fundamentals (`metric=all`)
//! - `news`: general headlines (`category=general`)
//! - `company-news`: per-symbol news, `YYYY-MM-DD` window
//! - `search`: free-text symbol lookup
//!
//! Every request carries the configured token as `token=<value>`. Query
//! values are percent-encoded before the URL is assembled, so a space in a
//! search query travels as `%20`.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use stockwatch_common::config::{ApiConfig, Config};

use super::provider::{FetchError, MarketDataProvider};
use super::{Metrics, NewsKind, NewsStory, PricePoint, SearchResult, Symbol, TimeSeries};

// ============================================================================
// Constants
// ============================================================================

const CANDLE_ENDPOINT: &str = "stock/candle";
const METRIC_ENDPOINT: &str = "stock/metric";
const NEWS_ENDPOINT: &str = "news";
const COMPANY_NEWS_ENDPOINT: &str = "company-news";
const SEARCH_ENDPOINT: &str = "search";

/// One-minute candles.
const CANDLE_RESOLUTION: &str = "1";

/// Candle status reported when the window holds no trades.
const NO_DATA_STATUS: &str = "no_data";

const DEFAULT_COMPANY_WINDOW_DAYS: u32 = 7;

const SECONDS_PER_DAY: i64 = 86_400;

// ============================================================================
// Wire types
// ============================================================================

/// Column-oriented candle payload, oldest first.
#[derive(Debug, Deserialize)]
struct CandleResponse {
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    v: Vec<f64>,
    s: String,
}

#[derive(Debug, Deserialize)]
struct MetricResponse {
    #[serde(default)]
    metric: MetricFields,
}

#[derive(Debug, Default, Deserialize)]
struct MetricFields {
    #[serde(rename = "52WeekHigh", default)]
    week52_high: Option<f64>,
    #[serde(rename = "52WeekLow", default)]
    week52_low: Option<f64>,
    #[serde(rename = "52WeekPriceReturnDaily", default)]
    week52_return: Option<f64>,
    #[serde(default)]
    beta: Option<f64>,
    #[serde(rename = "10DayAverageTradingVolume", default)]
    ten_day_avg_volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    category: String,
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    id: i64,
    #[serde(default)]
    image: String,
    #[serde(default)]
    related: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    #[allow(dead_code)]
    count: usize,
    #[serde(default)]
    result: Vec<SearchResult>,
}

// ============================================================================
// Decoding
// ============================================================================

/// Turn candle columns into a newest-first series.
fn decode_candles(response: CandleResponse) -> Result<TimeSeries, FetchError> {
    if response.s == NO_DATA_STATUS {
        return Ok(Vec::new());
    }
    if response.s != "ok" {
        return Err(FetchError::Decode(format!(
            "unexpected candle status '{}'",
            response.s
        )));
    }

    let len = response.t.len();
    let columns = [
        response.c.len(),
        response.h.len(),
        response.l.len(),
        response.o.len(),
        response.v.len(),
    ];
    if columns.iter().any(|&n| n != len) {
        return Err(FetchError::Decode(format!(
            "candle columns have mismatched lengths (t={}, c/h/l/o/v={:?})",
            len, columns
        )));
    }

    let mut series = Vec::with_capacity(len);
    for i in 0..len {
        let timestamp = Utc
            .timestamp_opt(response.t[i], 0)
            .single()
            .ok_or_else(|| FetchError::Decode(format!("invalid timestamp: {}", response.t[i])))?;

        series.push(PricePoint {
            timestamp,
            open: response.o[i],
            high: response.h[i],
            low: response.l[i],
            close: response.c[i],
            volume: response.v[i],
        });
    }

    // Wire order is oldest first
    series.reverse();
    Ok(series)
}

/// Stories with an out-of-range `datetime` are skipped.
fn decode_news(items: Vec<NewsItem>) -> Vec<NewsStory> {
    items
        .into_iter()
        .filter_map(|item| {
            let Some(published_at) = Utc.timestamp_opt(item.datetime, 0).single() else {
                debug!(id = item.id, datetime = item.datetime, "Skipping story with invalid timestamp");
                return None;
            };
            Some(NewsStory {
                id: item.id,
                category: item.category,
                published_at,
                headline: item.headline,
                image: item.image,
                related: item.related,
                source: item.source,
                summary: item.summary,
                url: item.url,
            })
        })
        .collect()
}

// ============================================================================
// Finnhub Client
// ============================================================================

/// HTTP client for the Finnhub API.
pub struct FinnhubClient {
    base_url: Url,
    token: Option<String>,
    company_window_days: u32,
    client: reqwest::Client,
}

impl FinnhubClient {
    /// Create a client for `base_url` with the default 30 s timeout.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, FetchError> {
        Self::with_timeout(base_url, token, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized).map_err(|e| {
            FetchError::InvalidRequest(format!("invalid base URL '{}': {}", base_url, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            token,
            company_window_days: DEFAULT_COMPANY_WINDOW_DAYS,
            client,
        })
    }

    /// Create from the `api` and `news` configuration sections.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let ApiConfig {
            base_url,
            token,
            timeout_secs,
        } = &config.api;
        Ok(
            Self::with_timeout(base_url, token.clone(), Duration::from_secs(*timeout_secs))?
                .with_company_window(config.news.company_window_days),
        )
    }

    /// Override the company-news window in days.
    pub fn with_company_window(mut self, days: u32) -> Self {
        self.company_window_days = days;
        self
    }

    /// Assemble an endpoint URL from already-raw parameter values.
    ///
    /// Values are percent-encoded here; the token is appended last.
    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| FetchError::InvalidRequest(format!("cannot build URL for {}: {}", path, e)))?;

        let mut pairs: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        if let Some(token) = &self.token {
            pairs.push(format!("token={}", urlencoding::encode(token)));
        }

        url.set_query(Some(&pairs.join("&")));
        Ok(url)
    }

    fn candle_url(&self, symbol: &Symbol, days: u32) -> Result<Url, FetchError> {
        let to = Utc::now().timestamp();
        let from = to - i64::from(days) * SECONDS_PER_DAY;
        self.endpoint(
            CANDLE_ENDPOINT,
            &[
                ("symbol", symbol.to_string()),
                ("resolution", CANDLE_RESOLUTION.to_string()),
                ("from", from.to_string()),
                ("to", to.to_string()),
            ],
        )
    }

    fn news_url(&self, kind: &NewsKind) -> Result<Url, FetchError> {
        match kind {
            NewsKind::TopStories => {
                self.endpoint(NEWS_ENDPOINT, &[("category", "general".to_string())])
            }
            NewsKind::Company(symbol) => {
                let today = Local::now().date_naive();
                let from = today - ChronoDuration::days(i64::from(self.company_window_days));
                self.endpoint(
                    COMPANY_NEWS_ENDPOINT,
                    &[
                        ("symbol", symbol.to_string()),
                        ("from", from.format("%Y-%m-%d").to_string()),
                        ("to", today.format("%Y-%m-%d").to_string()),
                    ],
                )
            }
        }
    }

    fn search_url(&self, query: &str) -> Result<Url, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FetchError::InvalidRequest("search query is blank".into()));
        }
        self.endpoint(SEARCH_ENDPOINT, &[("q", query.to_string())])
    }

    /// Issue one GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!(path = %url.path(), "Fetching from Finnhub");

        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_transport(&e))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(FetchError::EmptyResponse);
        }

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for FinnhubClient {
    fn name(&self) -> &'static str {
        "finnhub"
    }

    async fn market_data(&self, symbol: &Symbol, days: u32) -> Result<TimeSeries, FetchError> {
        let url = self.candle_url(symbol, days)?;
        let response: CandleResponse = self.get_json(url).await?;
        decode_candles(response)
    }

    async fn metrics(&self, symbol: &Symbol) -> Result<Metrics, FetchError> {
        let url = self.endpoint(
            METRIC_ENDPOINT,
            &[("symbol", symbol.to_string()), ("metric", "all".to_string())],
        )?;
        let response: MetricResponse = self.get_json(url).await?;
        let m = response.metric;
        Ok(Metrics {
            week52_high: m.week52_high,
            week52_low: m.week52_low,
            week52_return: m.week52_return,
            beta: m.beta,
            ten_day_avg_volume: m.ten_day_avg_volume,
        })
    }

    async fn news(&self, kind: &NewsKind) -> Result<Vec<NewsStory>, FetchError> {
        let url = self.news_url(kind)?;
        let items: Vec<NewsItem> = self.get_json(url).await?;
        Ok(decode_news(items))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, FetchError> {
        let url = self.search_url(query)?;
        let response: SearchResponse = self.get_json(url).await?;
        Ok(response.result)
    }
}
