//! Change-percentage calculator.
//!
//! Works on newest-first series. The "prior" close is the first point whose
//! calendar date differs from the latest point's; same-day points are
//! skipped. Degenerate inputs (empty series, one calendar day, a zero latest
//! close) yield `0.0` instead of an error.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::data::PricePoint;

/// Gain/loss classification of a change percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Gain,
    Loss,
    Flat,
}

impl ChangeDirection {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Self::Gain
        } else if change < 0.0 {
            Self::Loss
        } else {
            Self::Flat
        }
    }
}

/// Close of the newest point, or `0.0` for an empty series.
pub fn latest_price(series: &[PricePoint]) -> f64 {
    series.first().map_or(0.0, |p| p.close)
}

/// Change percentage using local calendar days.
pub fn change_percentage(series: &[PricePoint]) -> f64 {
    change_percentage_in(series, &Local)
}

/// Change percentage with calendar days taken in `tz`.
pub fn change_percentage_in<Tz: TimeZone>(series: &[PricePoint], tz: &Tz) -> f64 {
    let Some(latest) = series.first() else {
        return 0.0;
    };
    let latest_day = latest.timestamp.with_timezone(tz).date_naive();

    let prior = series
        .iter()
        .skip(1)
        .find(|p| p.timestamp.with_timezone(tz).date_naive() != latest_day);

    let Some(prior) = prior else {
        return 0.0;
    };
    if latest.close == 0.0 {
        return 0.0;
    }

    let change = 1.0 - prior.close / latest.close;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}
