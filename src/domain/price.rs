//! Daily price bar representation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;

/// One trading day of open/high/low/close prices for a single equity.
///
/// Prices are exact decimals; a whole run operates over a date-ascending
/// sequence with no duplicate dates (see [`validate_sequence`]).
#[derive(Debug, Clone, PartialEq)]
pub struct TradingDayPrice {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl TradingDayPrice {
    /// Build a bar, rejecting negative prices.
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Result<Self, PapertraderError> {
        for value in [open, high, low, close] {
            if value < Decimal::ZERO {
                return Err(PapertraderError::NegativePrice { value, date });
            }
        }
        Ok(Self {
            date,
            open,
            high,
            low,
            close,
        })
    }
}

/// Check that a price sequence is date-ascending with no duplicate dates.
pub fn validate_sequence(prices: &[TradingDayPrice]) -> Result<(), PapertraderError> {
    for pair in prices.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(PapertraderError::Data {
                reason: format!(
                    "price sequence not strictly date-ascending: {} followed by {}",
                    pair[0].date, pair[1].date
                ),
            });
        }
    }
    Ok(())
}
