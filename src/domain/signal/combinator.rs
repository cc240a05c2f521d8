//! Signal combinators.
//!
//! OR is a deduplicated union of two generators' signal sets. AND is an
//! intersection gated through a confirmation window: an anchor signal only
//! survives when the second generator corroborates it in time. Both
//! implement [`SignalGenerator`], so topologies nest.

use std::collections::BTreeSet;

use crate::domain::error::PapertraderError;
use crate::domain::price::TradingDayPrice;
use crate::domain::signal::confirmation::Confirmation;
use crate::domain::signal::{DatedSignal, SignalGenerator};

pub struct OrSignals {
    left: Box<dyn SignalGenerator>,
    right: Box<dyn SignalGenerator>,
}

impl OrSignals {
    pub fn new(left: Box<dyn SignalGenerator>, right: Box<dyn SignalGenerator>) -> Self {
        Self { left, right }
    }
}

impl SignalGenerator for OrSignals {
    fn generate(
        &mut self,
        prices: &[TradingDayPrice],
    ) -> Result<Vec<DatedSignal>, PapertraderError> {
        let mut merged: BTreeSet<DatedSignal> = self.left.generate(prices)?.into_iter().collect();
        merged.extend(self.right.generate(prices)?);
        Ok(merged.into_iter().collect())
    }

    fn required_trading_days(&self) -> usize {
        self.left
            .required_trading_days()
            .max(self.right.required_trading_days())
    }
}

pub struct ConfirmedSignals {
    anchor: Box<dyn SignalGenerator>,
    confirming: Box<dyn SignalGenerator>,
    confirmation: Confirmation,
}

impl ConfirmedSignals {
    pub fn new(
        anchor: Box<dyn SignalGenerator>,
        confirming: Box<dyn SignalGenerator>,
        confirmation: Confirmation,
    ) -> Self {
        Self {
            anchor,
            confirming,
            confirmation,
        }
    }
}

impl SignalGenerator for ConfirmedSignals {
    fn generate(
        &mut self,
        prices: &[TradingDayPrice],
    ) -> Result<Vec<DatedSignal>, PapertraderError> {
        let anchors = self.anchor.generate(prices)?;
        let candidates = self.confirming.generate(prices)?;

        // The decision is dated at the corroborating signal: it cannot be
        // known before the confirmation arrives.
        let mut confirmed = BTreeSet::new();
        for anchor in &anchors {
            let hit = candidates.iter().find(|candidate| {
                candidate.signal_type == anchor.signal_type
                    && self.confirmation.is_confirmed_by(anchor, candidate)
            });
            if let Some(candidate) = hit {
                confirmed.insert(*candidate);
            }
        }
        Ok(confirmed.into_iter().collect())
    }

    fn required_trading_days(&self) -> usize {
        self.anchor
            .required_trading_days()
            .max(self.confirming.required_trading_days())
            + self.confirmation.required_trading_days()
    }
}
