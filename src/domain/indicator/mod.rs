//! Technical indicator calculators and their value types.
//!
//! This module provides types for representing indicator values and lines:
//! - `IndicatorPoint`: a single dated value in an indicator line
//! - `IndicatorType`: enum for indicator identity + parameters
//! - `IndicatorLine`: the dated series a calculator produces
//! - `CalculationContext`: decimal precision/rounding policy and data bounds
//!
//! Calculators produce only the trailing sub-range for which the calculation
//! is valid; warmup days carry no point at all.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use self::ema::calculate_ema;
pub use self::macd::calculate_macd;
pub use self::rsi::calculate_rsi;
pub use self::sma::calculate_sma;

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::error::PapertraderError;

/// Decimal precision policy for indicator and fee-proration arithmetic, plus
/// the store-sizing ceiling on calculator input length.
#[derive(Debug, Clone)]
pub struct CalculationContext {
    pub scale: u32,
    pub rounding: RoundingStrategy,
    pub max_data_points: usize,
}

impl Default for CalculationContext {
    fn default() -> Self {
        Self {
            scale: 10,
            rounding: RoundingStrategy::MidpointNearestEven,
            max_data_points: 10_000,
        }
    }
}

impl CalculationContext {
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.scale, self.rounding)
    }
}

/// Reject inputs outside `[need, ctx.max_data_points]`.
pub fn check_data_bounds(
    have: usize,
    need: usize,
    ctx: &CalculationContext,
) -> Result<(), PapertraderError> {
    if have < need {
        return Err(PapertraderError::TooFewDataPoints { have, need });
    }
    if have > ctx.max_data_points {
        return Err(PapertraderError::TooManyDataPoints {
            have,
            limit: ctx.max_data_points,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(window) => write!(f, "SMA({})", window),
            IndicatorType::Ema(window) => write!(f, "EMA({})", window),
            IndicatorType::Rsi(window) => write!(f, "RSI({})", window),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}

/// A dated series of computed indicator values, date-ascending, never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorLine {
    pub indicator_type: IndicatorType,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorLine {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<Decimal> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
        assert_eq!(IndicatorType::Ema(50).to_string(), "EMA(50)");
        assert_eq!(IndicatorType::Rsi(14).to_string(), "RSI(14)");
        assert_eq!(
            IndicatorType::Macd {
                fast: 12,
                slow: 26,
                signal: 9
            }
            .to_string(),
            "MACD(12,26,9)"
        );
    }

    #[test]
    fn context_round_applies_scale() {
        let ctx = CalculationContext {
            scale: 4,
            ..Default::default()
        };
        assert_eq!(ctx.round(dec!(1.23456)), dec!(1.2346));
    }

    #[test]
    fn check_data_bounds_too_few() {
        let ctx = CalculationContext::default();
        let err = check_data_bounds(3, 20, &ctx).unwrap_err();
        assert!(
            matches!(err, PapertraderError::TooFewDataPoints { have: 3, need: 20 })
        );
    }

    #[test]
    fn check_data_bounds_too_many() {
        let ctx = CalculationContext {
            max_data_points: 5,
            ..Default::default()
        };
        let err = check_data_bounds(6, 2, &ctx).unwrap_err();
        assert!(
            matches!(err, PapertraderError::TooManyDataPoints { have: 6, limit: 5 })
        );
    }

    #[test]
    fn value_on_finds_by_date() {
        let line = IndicatorLine {
            indicator_type: IndicatorType::Sma(2),
            points: vec![
                IndicatorPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    value: dec!(10.5),
                },
                IndicatorPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                    value: dec!(11.0),
                },
            ],
        };
        assert_eq!(
            line.value_on(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()),
            Some(dec!(11.0))
        );
        assert_eq!(
            line.value_on(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()),
            None
        );
    }
}
