//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//!
//! The produced line is the histogram (MACD Line - Signal Line): a
//! single-valued dated series whose sign changes drive the crossing signal
//! generator. Warmup: slow + signal - 2 days produce no point.

use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;
use crate::domain::indicator::ema::ema_over;
use crate::domain::indicator::{
    check_data_bounds, CalculationContext, IndicatorLine, IndicatorPoint, IndicatorType,
};
use crate::domain::price::TradingDayPrice;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    prices: &[TradingDayPrice],
    fast: usize,
    slow: usize,
    signal: usize,
    ctx: &CalculationContext,
) -> Result<IndicatorLine, PapertraderError> {
    if fast == 0 || slow == 0 || signal == 0 {
        return Err(PapertraderError::StrategyInvalid {
            reason: "MACD periods must be positive".into(),
        });
    }
    if fast >= slow {
        return Err(PapertraderError::StrategyInvalid {
            reason: format!("MACD fast period {} must be below slow period {}", fast, slow),
        });
    }
    let need = slow + signal - 1;
    check_data_bounds(prices.len(), need, ctx)?;

    let closes: Vec<Decimal> = prices.iter().map(|p| p.close).collect();
    let ema_fast = ema_over(&closes, fast, ctx);
    let ema_slow = ema_over(&closes, slow, ctx);

    // Fast values start at index (fast-1); align both to the slow warmup.
    let offset = slow - fast;
    let macd_line: Vec<Decimal> = ema_slow
        .iter()
        .enumerate()
        .map(|(i, &slow_value)| ema_fast[i + offset] - slow_value)
        .collect();

    let signal_line = ema_over(&macd_line, signal, ctx);

    let points = prices[need - 1..]
        .iter()
        .zip(signal_line.iter().enumerate())
        .map(|(price, (i, &signal_value))| IndicatorPoint {
            date: price.date,
            value: macd_line[i + signal - 1] - signal_value,
        })
        .collect();

    Ok(IndicatorLine {
        indicator_type: IndicatorType::Macd { fast, slow, signal },
        points,
    })
}
