//! Anchor-signal confirmation windows.
//!
//! An anchor signal is only acted on when corroborated by a second signal
//! inside an inclusive day-offset window, suppressing false positives.

use chrono::Days;

use crate::domain::signal::DatedSignal;

/// Inclusive window `[anchor + delay, anchor + delay + range]` in calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    delay: u32,
    range: u32,
}

impl Confirmation {
    pub fn new(delay: u32, range: u32) -> Self {
        Self { delay, range }
    }

    pub fn is_confirmed_by(&self, anchor: &DatedSignal, candidate: &DatedSignal) -> bool {
        let Some(open) = anchor.date.checked_add_days(Days::new(self.delay as u64)) else {
            return false;
        };
        let Some(close) = open.checked_add_days(Days::new(self.range as u64)) else {
            return false;
        };
        candidate.date >= open && candidate.date <= close
    }

    pub fn required_trading_days(&self) -> usize {
        (self.delay + self.range) as usize
    }
}
