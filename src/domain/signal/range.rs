//! Signal date range filtering.
//!
//! Restricts which calendar dates are eligible to emit a signal: days too
//! close to the leading edge of the available data, where indicator values
//! are not yet stable, are excluded.

use chrono::NaiveDate;

use crate::domain::price::TradingDayPrice;

/// Inclusive date window eligible for signal emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalDateRange {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl SignalDateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.earliest && date <= self.latest
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SignalRangeFilter {
    required_trading_days: usize,
}

impl SignalRangeFilter {
    pub fn new(required_trading_days: usize) -> Self {
        Self {
            required_trading_days,
        }
    }

    /// The eligible window over a price sequence: the trailing
    /// `required_trading_days + 1` dates, or the whole sequence when shorter.
    /// Empty input has no eligible window.
    pub fn range_of(&self, prices: &[TradingDayPrice]) -> Option<SignalDateRange> {
        let latest = prices.last()?.date;
        let start = prices
            .len()
            .saturating_sub(self.required_trading_days + 1);
        Some(SignalDateRange {
            earliest: prices[start].date,
            latest,
        })
    }
}
