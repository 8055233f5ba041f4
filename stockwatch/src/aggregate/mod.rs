//! Watchlist aggregation.
//!
//! Turns the watchlist into display rows: fans out per-symbol fetches,
//! joins on completion, derives change values and builds one row per
//! symbol that has data.

mod change;
mod coordinator;
mod detail;

pub use change::{change_percentage, change_percentage_in, latest_price, ChangeDirection};
pub use coordinator::{BatchStats, WatchlistCoordinator, WatchlistUpdate};
pub use detail::{DetailLoader, MetricRow, StockDetail};

use serde::Serialize;

use crate::data::{Symbol, TimeSeries};
use crate::format;
use crate::watchlist::WatchlistEntry;

/// Display-ready view of one watchlist symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistRow {
    pub symbol: Symbol,
    pub company_name: String,
    pub latest_price: f64,
    pub change_percentage: f64,
    pub direction: ChangeDirection,
    pub price_display: String,
    pub change_display: String,
    /// Closes oldest first, for a sparkline
    pub chart: Vec<f64>,
    pub series: TimeSeries,
}

impl WatchlistRow {
    pub fn from_series(entry: &WatchlistEntry, series: &TimeSeries) -> Self {
        let latest_price = latest_price(series);
        let change_percentage = change_percentage(series);

        Self {
            symbol: entry.symbol.clone(),
            company_name: entry.display_name.clone(),
            latest_price,
            change_percentage,
            direction: ChangeDirection::from_change(change_percentage),
            price_display: format::price(latest_price),
            change_display: format::percentage(change_percentage),
            chart: series.iter().rev().map(|p| p.close).collect(),
            series: series.clone(),
        }
    }
}
