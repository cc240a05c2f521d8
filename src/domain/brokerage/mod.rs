//! Brokerage equity custody and trade execution.
//!
//! Tracks the equity balance, applies the fee schedule in effect, and counts
//! trades within the current calendar month for fee tiering. Every balance
//! mutation emits an event before the call returns. A sell that exceeds the
//! balance aborts with no partial execution.

pub mod fees;

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::equity::{EquityClass, EquityOrderVolume};
use crate::domain::error::PapertraderError;
use crate::domain::event::{
    BrokerageEvent, BrokerageEventListener, BrokerageEventType, EquityEvent, EquityEventListener,
    EquityEventType,
};
use self::fees::FeeSchedule;

pub struct Brokerage {
    equity_balance: Decimal,
    schedule: FeeSchedule,
    trades_this_month: u32,
    month: Option<(i32, u32)>,
    brokerage_listeners: Vec<Rc<RefCell<dyn BrokerageEventListener>>>,
    equity_listeners: Vec<Rc<RefCell<dyn EquityEventListener>>>,
}

impl std::fmt::Debug for Brokerage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Brokerage")
            .field("equity_balance", &self.equity_balance)
            .field("schedule", &self.schedule)
            .field("trades_this_month", &self.trades_this_month)
            .field("month", &self.month)
            .field("brokerage_listeners", &self.brokerage_listeners.len())
            .field("equity_listeners", &self.equity_listeners.len())
            .finish()
    }
}

impl Brokerage {
    /// Class support is checked once here, at configuration time.
    pub fn new(schedule: FeeSchedule, class: EquityClass) -> Result<Self, PapertraderError> {
        if !schedule.supports(class) {
            return Err(PapertraderError::UnsupportedEquityClass {
                class: class.to_string(),
                structure: schedule.name().to_string(),
            });
        }
        Ok(Self {
            equity_balance: Decimal::ZERO,
            schedule,
            trades_this_month: 0,
            month: None,
            brokerage_listeners: Vec::new(),
            equity_listeners: Vec::new(),
        })
    }

    pub fn equity_balance(&self) -> Decimal {
        self.equity_balance
    }

    pub fn trades_this_month(&self) -> u32 {
        self.trades_this_month
    }

    pub fn register_listener(&mut self, listener: Rc<RefCell<dyn BrokerageEventListener>>) {
        self.brokerage_listeners.push(listener);
    }

    pub fn register_equity_listener(&mut self, listener: Rc<RefCell<dyn EquityEventListener>>) {
        self.equity_listeners.push(listener);
    }

    /// Fee the next trade on `date` would incur for `trade_value`. Pure.
    pub fn cost(&self, trade_value: Decimal, date: NaiveDate) -> Decimal {
        self.schedule.cost(trade_value, self.next_trade_number(date))
    }

    /// Execute a buy: equity balance rises by the volume. Returns the total
    /// cost, trade value plus fee.
    pub fn buy(&mut self, price: Decimal, volume: &EquityOrderVolume, date: NaiveDate) -> Decimal {
        let value = price * volume.value();
        let fee = self.cost(value, date);
        self.count_trade(date);

        let before = self.equity_balance;
        self.equity_balance += volume.value();
        self.notify_brokerage(BrokerageEvent {
            event_type: BrokerageEventType::Buy,
            amount: volume.value(),
            before,
            after: self.equity_balance,
            date,
        });
        value + fee
    }

    /// Execute a sell: equity balance falls by the volume. Returns the net
    /// proceeds, trade value minus fee. Fails with no mutation when the
    /// volume exceeds the balance.
    pub fn sell(
        &mut self,
        price: Decimal,
        volume: &EquityOrderVolume,
        date: NaiveDate,
    ) -> Result<Decimal, PapertraderError> {
        if volume.value() > self.equity_balance {
            return Err(PapertraderError::InsufficientEquities {
                requested: volume.value(),
                balance: self.equity_balance,
            });
        }
        let value = price * volume.value();
        let fee = self.cost(value, date);
        self.count_trade(date);

        let before = self.equity_balance;
        self.equity_balance -= volume.value();
        self.notify_brokerage(BrokerageEvent {
            event_type: BrokerageEventType::Sell,
            amount: volume.value(),
            before,
            after: self.equity_balance,
            date,
        });
        Ok(value - fee)
    }

    /// Reduce the equity balance outside of trading (management fee charged
    /// against the holding). Does not count as a trade.
    pub fn charge_equity(
        &mut self,
        volume: Decimal,
        date: NaiveDate,
    ) -> Result<(), PapertraderError> {
        if volume > self.equity_balance {
            return Err(PapertraderError::InsufficientEquities {
                requested: volume,
                balance: self.equity_balance,
            });
        }
        let before = self.equity_balance;
        self.equity_balance -= volume;
        let event = EquityEvent {
            event_type: EquityEventType::ManagementFee,
            amount: volume,
            before,
            after: self.equity_balance,
            date,
        };
        for listener in &self.equity_listeners {
            listener.borrow_mut().equity_event(&event);
        }
        Ok(())
    }

    fn next_trade_number(&self, date: NaiveDate) -> u32 {
        if self.month == Some((date.year(), date.month())) {
            self.trades_this_month + 1
        } else {
            1
        }
    }

    fn count_trade(&mut self, date: NaiveDate) {
        let month = (date.year(), date.month());
        if self.month != Some(month) {
            self.month = Some(month);
            self.trades_this_month = 0;
        }
        self.trades_this_month += 1;
    }

    fn notify_brokerage(&self, event: BrokerageEvent) {
        for listener in &self.brokerage_listeners {
            listener.borrow_mut().brokerage_event(&event);
        }
    }
}
