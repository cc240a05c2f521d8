//! MACD histogram crossing signal generator.
//!
//! Bullish when the histogram crosses from non-positive to positive,
//! bearish when it crosses from non-negative to negative.

use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;
use crate::domain::indicator::{calculate_macd, CalculationContext};
use crate::domain::price::TradingDayPrice;
use crate::domain::signal::range::SignalRangeFilter;
use crate::domain::signal::{DatedSignal, SignalGenerator, SignalType};

#[derive(Debug, Clone)]
pub struct MacdCrossSignals {
    fast: usize,
    slow: usize,
    signal: usize,
    direction: SignalType,
    lookback: usize,
    ctx: CalculationContext,
}

impl MacdCrossSignals {
    pub fn new(
        fast: usize,
        slow: usize,
        signal: usize,
        direction: SignalType,
        lookback: usize,
        ctx: CalculationContext,
    ) -> Self {
        Self {
            fast,
            slow,
            signal,
            direction,
            lookback,
            ctx,
        }
    }
}

impl SignalGenerator for MacdCrossSignals {
    fn generate(
        &mut self,
        prices: &[TradingDayPrice],
    ) -> Result<Vec<DatedSignal>, PapertraderError> {
        let line = calculate_macd(prices, self.fast, self.slow, self.signal, &self.ctx)?;

        let filter = SignalRangeFilter::new(self.required_trading_days());
        let Some(range) = filter.range_of(prices) else {
            return Ok(Vec::new());
        };

        let mut signals = Vec::new();
        for pair in line.points.windows(2) {
            let fires = match self.direction {
                SignalType::Bullish => {
                    pair[0].value <= Decimal::ZERO && pair[1].value > Decimal::ZERO
                }
                SignalType::Bearish => {
                    pair[0].value >= Decimal::ZERO && pair[1].value < Decimal::ZERO
                }
            };
            if fires && range.contains(pair[1].date) {
                signals.push(DatedSignal::new(pair[1].date, self.direction));
            }
        }
        Ok(signals)
    }

    fn required_trading_days(&self) -> usize {
        self.lookback + self.slow + self.signal - 1
    }
}
