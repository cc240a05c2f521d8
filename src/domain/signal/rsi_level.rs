//! RSI level-crossing signal generator.
//!
//! Bullish when RSI crosses up through the oversold level, bearish when it
//! crosses down through the overbought level.

use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;
use crate::domain::indicator::{calculate_rsi, CalculationContext};
use crate::domain::price::TradingDayPrice;
use crate::domain::signal::range::SignalRangeFilter;
use crate::domain::signal::{DatedSignal, SignalGenerator, SignalType};

pub const DEFAULT_OVERSOLD: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
pub const DEFAULT_OVERBOUGHT: Decimal = Decimal::from_parts(70, 0, 0, false, 0);

#[derive(Debug, Clone)]
pub struct RsiLevelSignals {
    window: usize,
    oversold: Decimal,
    overbought: Decimal,
    direction: SignalType,
    lookback: usize,
    ctx: CalculationContext,
}

impl RsiLevelSignals {
    pub fn new(
        window: usize,
        oversold: Decimal,
        overbought: Decimal,
        direction: SignalType,
        lookback: usize,
        ctx: CalculationContext,
    ) -> Self {
        Self {
            window,
            oversold,
            overbought,
            direction,
            lookback,
            ctx,
        }
    }
}

impl SignalGenerator for RsiLevelSignals {
    fn generate(
        &mut self,
        prices: &[TradingDayPrice],
    ) -> Result<Vec<DatedSignal>, PapertraderError> {
        let line = calculate_rsi(prices, self.window, &self.ctx)?;

        let filter = SignalRangeFilter::new(self.required_trading_days());
        let Some(range) = filter.range_of(prices) else {
            return Ok(Vec::new());
        };

        let mut signals = Vec::new();
        for pair in line.points.windows(2) {
            let fires = match self.direction {
                SignalType::Bullish => {
                    pair[0].value <= self.oversold && pair[1].value > self.oversold
                }
                SignalType::Bearish => {
                    pair[0].value >= self.overbought && pair[1].value < self.overbought
                }
            };
            if fires && range.contains(pair[1].date) {
                signals.push(DatedSignal::new(pair[1].date, self.direction));
            }
        }
        Ok(signals)
    }

    fn required_trading_days(&self) -> usize {
        self.lookback + self.window + 1
    }
}
