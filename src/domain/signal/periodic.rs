//! Calendar-driven periodic signals.
//!
//! A fallback generator independent of indicators, e.g. a weekly
//! deposit-triggered buy. The schedule state machine is shared with the
//! simulation's deposit clock.

use chrono::{Days, NaiveDate};

use crate::domain::error::PapertraderError;
use crate::domain::price::TradingDayPrice;
use crate::domain::signal::{DatedSignal, SignalGenerator, SignalType};

/// One-field state machine over `last_date`.
///
/// `due(t)` answers whether a period has elapsed by `t`; when it has,
/// `last_date` advances by whole multiples of the frequency to the largest
/// value not after `t`. Asking twice for the same `t` is due at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicSchedule {
    last_date: NaiveDate,
    frequency_days: u64,
}

impl PeriodicSchedule {
    /// `last_date` starts one whole period before the first due date.
    pub fn new(first_date: NaiveDate, frequency_days: u64) -> Self {
        let last_date = first_date
            .checked_sub_days(Days::new(frequency_days))
            .unwrap_or(NaiveDate::MIN);
        Self {
            last_date,
            frequency_days,
        }
    }

    pub fn due(&mut self, latest: NaiveDate) -> bool {
        if self.frequency_days == 0 {
            return false;
        }
        let Some(threshold) = self
            .last_date
            .checked_add_days(Days::new(self.frequency_days))
        else {
            return false;
        };
        if latest < threshold {
            return false;
        }

        let mut next = threshold;
        while let Some(candidate) = next.checked_add_days(Days::new(self.frequency_days)) {
            if candidate > latest {
                break;
            }
            next = candidate;
        }
        self.last_date = next;
        true
    }
}

pub struct PeriodicSignals {
    schedule: PeriodicSchedule,
    direction: SignalType,
}

impl PeriodicSignals {
    pub fn new(first_order_date: NaiveDate, frequency_days: u64, direction: SignalType) -> Self {
        Self {
            schedule: PeriodicSchedule::new(first_order_date, frequency_days),
            direction,
        }
    }
}

impl SignalGenerator for PeriodicSignals {
    fn generate(
        &mut self,
        prices: &[TradingDayPrice],
    ) -> Result<Vec<DatedSignal>, PapertraderError> {
        let Some(latest) = prices.last() else {
            return Ok(Vec::new());
        };
        if self.schedule.due(latest.date) {
            Ok(vec![DatedSignal::new(latest.date, self.direction)])
        } else {
            Ok(Vec::new())
        }
    }

    fn required_trading_days(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(offset))
            .unwrap()
    }

    fn prices_ending(offset: u64) -> Vec<TradingDayPrice> {
        (0..=offset)
            .map(|i| {
                TradingDayPrice::new(day(i), dec!(10), dec!(10), dec!(10), dec!(10)).unwrap()
            })
            .collect()
    }

    #[test]
    fn weekly_emission_sequence() {
        // First order date = day 0, frequency = 7 days.
        let mut generator = PeriodicSignals::new(day(0), 7, SignalType::Bullish);

        let signals = generator.generate(&prices_ending(0)).unwrap();
        assert_eq!(signals, vec![DatedSignal::new(day(0), SignalType::Bullish)]);

        let signals = generator.generate(&prices_ending(6)).unwrap();
        assert!(signals.is_empty());

        let signals = generator.generate(&prices_ending(7)).unwrap();
        assert_eq!(signals, vec![DatedSignal::new(day(7), SignalType::Bullish)]);
    }

    #[test]
    fn never_emits_twice_for_the_same_date() {
        let mut generator = PeriodicSignals::new(day(0), 7, SignalType::Bullish);
        assert_eq!(generator.generate(&prices_ending(0)).unwrap().len(), 1);
        assert!(generator.generate(&prices_ending(0)).unwrap().is_empty());
    }

    #[test]
    fn gap_advances_by_whole_multiples() {
        let mut generator = PeriodicSignals::new(day(0), 7, SignalType::Bullish);
        // Jump straight past three periods: one signal, then quiet until
        // the next boundary at day 28.
        let signals = generator.generate(&prices_ending(23)).unwrap();
        assert_eq!(signals, vec![DatedSignal::new(day(23), SignalType::Bullish)]);

        assert!(generator.generate(&prices_ending(27)).unwrap().is_empty());
        assert_eq!(generator.generate(&prices_ending(28)).unwrap().len(), 1);
    }

    #[test]
    fn empty_price_sequence_emits_nothing() {
        let mut generator = PeriodicSignals::new(day(0), 7, SignalType::Bullish);
        assert!(generator.generate(&[]).unwrap().is_empty());
    }

    #[test]
    fn schedule_zero_frequency_never_due() {
        let mut schedule = PeriodicSchedule::new(day(0), 0);
        assert!(!schedule.due(day(100)));
    }
}
