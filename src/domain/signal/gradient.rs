//! Moving-average gradient signal generators.
//!
//! Emits a signal on date d iff d is in the eligible range and the average
//! moved in the generator's direction from d-1 to d. The first point of a
//! line never emits (no predecessor).

use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;
use crate::domain::indicator::{calculate_ema, calculate_sma, CalculationContext};
use crate::domain::price::TradingDayPrice;
use crate::domain::signal::range::SignalRangeFilter;
use crate::domain::signal::{DatedSignal, SignalGenerator, SignalType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovingAverage {
    Simple(usize),
    Exponential(usize),
}

impl MovingAverage {
    fn window(&self) -> usize {
        match self {
            MovingAverage::Simple(window) | MovingAverage::Exponential(window) => *window,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GradientSignals {
    average: MovingAverage,
    direction: SignalType,
    lookback: usize,
    ctx: CalculationContext,
}

impl GradientSignals {
    pub fn new(
        average: MovingAverage,
        direction: SignalType,
        lookback: usize,
        ctx: CalculationContext,
    ) -> Self {
        Self {
            average,
            direction,
            lookback,
            ctx,
        }
    }
}

impl SignalGenerator for GradientSignals {
    fn generate(
        &mut self,
        prices: &[TradingDayPrice],
    ) -> Result<Vec<DatedSignal>, PapertraderError> {
        let line = match self.average {
            MovingAverage::Simple(window) => calculate_sma(prices, window, &self.ctx)?,
            MovingAverage::Exponential(window) => calculate_ema(prices, window, &self.ctx)?,
        };

        let filter = SignalRangeFilter::new(self.required_trading_days());
        let Some(range) = filter.range_of(prices) else {
            return Ok(Vec::new());
        };

        let mut signals = Vec::new();
        for pair in line.points.windows(2) {
            let delta = pair[1].value - pair[0].value;
            let fires = match self.direction {
                SignalType::Bullish => delta > Decimal::ZERO,
                SignalType::Bearish => delta < Decimal::ZERO,
            };
            if fires && range.contains(pair[1].date) {
                signals.push(DatedSignal::new(pair[1].date, self.direction));
            }
        }
        Ok(signals)
    }

    fn required_trading_days(&self) -> usize {
        self.lookback + self.average.window()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn make_prices(closes: &[Decimal]) -> Vec<TradingDayPrice> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .checked_add_days(chrono::Days::new(i as u64))
                    .unwrap();
                TradingDayPrice::new(date, close, close, close, close).unwrap()
            })
            .collect()
    }

    #[test]
    fn flat_then_rising_emits_single_bullish() {
        // SMA(1) line equals the closes: flat d0->d1 emits nothing,
        // positive d1->d2 emits one bullish signal at d2.
        let prices = make_prices(&[dec!(1.0), dec!(1.0), dec!(1.2)]);
        let mut generator = GradientSignals::new(
            MovingAverage::Simple(1),
            SignalType::Bullish,
            2,
            CalculationContext::default(),
        );

        let signals = generator.generate(&prices).unwrap();
        assert_eq!(
            signals,
            vec![DatedSignal::new(prices[2].date, SignalType::Bullish)]
        );
    }

    #[test]
    fn first_point_never_emits() {
        let prices = make_prices(&[dec!(1.0), dec!(2.0), dec!(3.0)]);
        let mut generator = GradientSignals::new(
            MovingAverage::Simple(2),
            SignalType::Bullish,
            2,
            CalculationContext::default(),
        );

        let signals = generator.generate(&prices).unwrap();
        // SMA(2) has points at d1, d2; only d2 has a predecessor.
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].date, prices[2].date);
    }

    #[test]
    fn bearish_gradient_on_decline() {
        let prices = make_prices(&[dec!(3.0), dec!(2.0), dec!(1.0)]);
        let mut generator = GradientSignals::new(
            MovingAverage::Exponential(1),
            SignalType::Bearish,
            2,
            CalculationContext::default(),
        );

        let signals = generator.generate(&prices).unwrap();
        assert_eq!(signals.len(), 2);
        assert!(signals
            .iter()
            .all(|s| s.signal_type == SignalType::Bearish));
    }

    #[test]
    fn out_of_range_dates_suppressed() {
        // lookback 0, window 1: required = 1, range covers the last 2 dates,
        // so the rise into d1 is outside the eligible window.
        let prices = make_prices(&[dec!(1), dec!(2), dec!(3), dec!(4)]);
        let mut generator = GradientSignals::new(
            MovingAverage::Simple(1),
            SignalType::Bullish,
            0,
            CalculationContext::default(),
        );

        let signals = generator.generate(&prices).unwrap();
        assert_eq!(
            signals,
            vec![
                DatedSignal::new(prices[2].date, SignalType::Bullish),
                DatedSignal::new(prices[3].date, SignalType::Bullish),
            ]
        );
    }

    #[test]
    fn too_few_prices_propagates() {
        let prices = make_prices(&[dec!(1)]);
        let mut generator = GradientSignals::new(
            MovingAverage::Simple(5),
            SignalType::Bullish,
            1,
            CalculationContext::default(),
        );
        assert!(matches!(
            generator.generate(&prices),
            Err(PapertraderError::TooFewDataPoints { .. })
        ));
    }

    #[test]
    fn required_days_is_lookback_plus_window() {
        let generator = GradientSignals::new(
            MovingAverage::Simple(20),
            SignalType::Bullish,
            5,
            CalculationContext::default(),
        );
        assert_eq!(generator.required_trading_days(), 25);
    }
}
