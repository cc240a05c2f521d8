//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! The first (n-1) days produce no point.

use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;
use crate::domain::indicator::{
    check_data_bounds, CalculationContext, IndicatorLine, IndicatorPoint, IndicatorType,
};
use crate::domain::price::TradingDayPrice;

pub fn calculate_ema(
    prices: &[TradingDayPrice],
    window: usize,
    ctx: &CalculationContext,
) -> Result<IndicatorLine, PapertraderError> {
    if window == 0 {
        return Err(PapertraderError::StrategyInvalid {
            reason: "moving average window must be positive".into(),
        });
    }
    check_data_bounds(prices.len(), window, ctx)?;

    let closes: Vec<Decimal> = prices.iter().map(|p| p.close).collect();
    let values = ema_over(&closes, window, ctx);

    let points = prices[window - 1..]
        .iter()
        .zip(values)
        .map(|(price, value)| IndicatorPoint {
            date: price.date,
            value,
        })
        .collect();

    Ok(IndicatorLine {
        indicator_type: IndicatorType::Ema(window),
        points,
    })
}

/// EMA over raw values; returns one value per input from index (window-1) on.
/// Shared with the MACD signal-line calculation.
pub(crate) fn ema_over(values: &[Decimal], window: usize, ctx: &CalculationContext) -> Vec<Decimal> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }

    let divisor = Decimal::from(window);
    let k = ctx.round(Decimal::TWO / Decimal::from(window + 1));
    let one_minus_k = Decimal::ONE - k;

    let seed: Decimal = values[..window].iter().copied().sum();
    let mut ema = ctx.round(seed / divisor);

    let mut out = Vec::with_capacity(values.len() - window + 1);
    out.push(ema);
    for value in &values[window..] {
        ema = ctx.round(*value * k + ema * one_minus_k);
        out.push(ema);
    }
    out
}
