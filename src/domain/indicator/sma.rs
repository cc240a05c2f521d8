//! Simple Moving Average indicator.
//!
//! SMA[i] = mean(close[i-w+1..=i]). The first (w-1) days produce no point.

use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;
use crate::domain::indicator::{
    check_data_bounds, CalculationContext, IndicatorLine, IndicatorPoint, IndicatorType,
};
use crate::domain::price::TradingDayPrice;

pub fn calculate_sma(
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

    let divisor = Decimal::from(window);
    let mut sum = Decimal::ZERO;
    let mut points = Vec::with_capacity(prices.len() - window + 1);

    for (i, price) in prices.iter().enumerate() {
        sum += price.close;
        if i >= window {
            sum -= prices[i - window].close;
        }
        if i >= window - 1 {
            points.push(IndicatorPoint {
                date: price.date,
                value: ctx.round(sum / divisor),
            });
        }
    }

    Ok(IndicatorLine {
        indicator_type: IndicatorType::Sma(window),
        points,
    })
}
