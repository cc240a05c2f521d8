//! RSI (Relative Strength Index) indicator.
//!
//! Wilder's smoothing for average gain/loss:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)); avg_loss of zero gives 100.
//! Warmup: the first n days produce no point (n price changes are needed).

use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;
use crate::domain::indicator::{
    check_data_bounds, CalculationContext, IndicatorLine, IndicatorPoint, IndicatorType,
};
use crate::domain::price::TradingDayPrice;

pub fn calculate_rsi(
    prices: &[TradingDayPrice],
    window: usize,
    ctx: &CalculationContext,
) -> Result<IndicatorLine, PapertraderError> {
    if window == 0 {
        return Err(PapertraderError::StrategyInvalid {
            reason: "RSI window must be positive".into(),
        });
    }
    check_data_bounds(prices.len(), window + 1, ctx)?;

    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);
    for pair in prices.windows(2) {
        let change = pair[1].close - pair[0].close;
        if change > Decimal::ZERO {
            gains.push(change);
            losses.push(Decimal::ZERO);
        } else {
            gains.push(Decimal::ZERO);
            losses.push(-change);
        }
    }

    let divisor = Decimal::from(window);
    let smoothing = Decimal::from(window - 1);

    let mut avg_gain = ctx.round(gains[..window].iter().copied().sum::<Decimal>() / divisor);
    let mut avg_loss = ctx.round(losses[..window].iter().copied().sum::<Decimal>() / divisor);

    let mut points = Vec::with_capacity(prices.len() - window);
    points.push(IndicatorPoint {
        date: prices[window].date,
        value: rsi_value(avg_gain, avg_loss, ctx),
    });

    for i in window..gains.len() {
        avg_gain = ctx.round((avg_gain * smoothing + gains[i]) / divisor);
        avg_loss = ctx.round((avg_loss * smoothing + losses[i]) / divisor);
        points.push(IndicatorPoint {
            date: prices[i + 1].date,
            value: rsi_value(avg_gain, avg_loss, ctx),
        });
    }

    Ok(IndicatorLine {
        indicator_type: IndicatorType::Rsi(window),
        points,
    })
}

fn rsi_value(avg_gain: Decimal, avg_loss: Decimal, ctx: &CalculationContext) -> Decimal {
    if avg_loss.is_zero() {
        return Decimal::ONE_HUNDRED;
    }
    let rs = avg_gain / avg_loss;
    ctx.round(Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs))
}
