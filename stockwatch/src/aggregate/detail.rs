//! Single-symbol detail aggregation.
//!
//! Market data (only when no seed series is supplied) and metrics are
//! fetched concurrently and joined once. Either fetch may fail; the detail
//! is still produced with an empty series or absent metrics.

use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use stockwatch_common::Result;

use super::{change_percentage, ChangeDirection};
use crate::data::{MarketDataProvider, Metrics, NewsKind, NewsStory, Symbol, TimeSeries};
use crate::format;
use crate::watchlist::WatchlistStore;

/// Labelled metric value for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricRow {
    pub label: &'static str,
    pub value: String,
}

impl MetricRow {
    /// The five detail-screen rows, in display order.
    pub fn from_metrics(metrics: &Metrics) -> Vec<Self> {
        [
            ("52W High", metrics.week52_high),
            ("52W Low", metrics.week52_low),
            ("52W Return", metrics.week52_return),
            ("Beta", metrics.beta),
            ("10D Vol", metrics.ten_day_avg_volume),
        ]
        .into_iter()
        .map(|(label, value)| Self {
            label,
            value: format::metric_value(value),
        })
        .collect()
    }
}

/// Everything the detail screen shows for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockDetail {
    pub symbol: Symbol,
    pub company_name: String,
    pub series: TimeSeries,
    pub metrics: Option<Metrics>,
    pub change_percentage: f64,
    pub direction: ChangeDirection,
    pub metric_rows: Vec<MetricRow>,
    pub in_watchlist: bool,
}

/// Loads detail data for one symbol at a time.
pub struct DetailLoader {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<WatchlistStore>,
    history_days: u32,
}

impl DetailLoader {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<WatchlistStore>,
        history_days: u32,
    ) -> Self {
        Self {
            provider,
            store,
            history_days,
        }
    }

    /// Load series and metrics. A non-empty `seed` skips the market data call.
    pub async fn load(
        &self,
        symbol: &Symbol,
        company_name: &str,
        seed: TimeSeries,
    ) -> Result<StockDetail> {
        let series_fut = async {
            if !seed.is_empty() {
                return seed;
            }
            match self.provider.market_data(symbol, self.history_days).await {
                Ok(series) => series,
                Err(e) => {
                    warn!(provider = self.provider.name(), symbol = %symbol, kind = %e.kind(), error = %e, "Detail market data fetch failed");
                    Vec::new()
                }
            }
        };

        let metrics_fut = async {
            match self.provider.metrics(symbol).await {
                Ok(metrics) => Some(metrics),
                Err(e) => {
                    warn!(provider = self.provider.name(), symbol = %symbol, kind = %e.kind(), error = %e, "Metrics fetch failed");
                    None
                }
            }
        };

        let (series, metrics) = tokio::join!(series_fut, metrics_fut);

        let change = change_percentage(&series);
        let metric_rows = metrics
            .as_ref()
            .map(MetricRow::from_metrics)
            .unwrap_or_default();

        Ok(StockDetail {
            symbol: symbol.clone(),
            company_name: company_name.to_string(),
            series,
            metrics,
            change_percentage: change,
            direction: ChangeDirection::from_change(change),
            metric_rows,
            in_watchlist: self.store.contains(symbol)?,
        })
    }

    /// Company news for the trailing window; failures yield an empty list.
    pub async fn company_news(&self, symbol: &Symbol) -> Vec<NewsStory> {
        match self.provider.news(&NewsKind::Company(symbol.clone())).await {
            Ok(stories) => stories,
            Err(e) => {
                warn!(provider = self.provider.name(), symbol = %symbol, kind = %e.kind(), error = %e, "Company news fetch failed");
                Vec::new()
            }
        }
    }

    /// Add the symbol to the watchlist, notifying subscribers.
    pub fn add_to_watchlist(&self, symbol: &Symbol, company_name: &str) -> Result<()> {
        self.store.add(symbol, company_name)
    }
}
