//! Cash account ledger.
//!
//! A single balance mutated only through debit/credit/deposit. The balance
//! never goes negative: a debit that would overdraw fails and leaves the
//! balance unchanged. Every successful mutation emits a [`CashEvent`] to
//! all registered listeners, synchronously, in registration order, before
//! the call returns.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;
use crate::domain::event::{CashEvent, CashEventListener, CashEventType};

pub struct CashAccount {
    balance: Decimal,
    listeners: Vec<Rc<RefCell<dyn CashEventListener>>>,
}

impl std::fmt::Debug for CashAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CashAccount")
            .field("balance", &self.balance)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl CashAccount {
    pub fn new() -> Self {
        Self {
            balance: Decimal::ZERO,
            listeners: Vec::new(),
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn register_listener(&mut self, listener: Rc<RefCell<dyn CashEventListener>>) {
        self.listeners.push(listener);
    }

    pub fn deposit(&mut self, amount: Decimal, date: NaiveDate) -> Result<(), PapertraderError> {
        self.add(CashEventType::Deposit, amount, date)
    }

    pub fn credit(&mut self, amount: Decimal, date: NaiveDate) -> Result<(), PapertraderError> {
        self.add(CashEventType::Credit, amount, date)
    }

    pub fn debit(&mut self, amount: Decimal, date: NaiveDate) -> Result<(), PapertraderError> {
        check_amount(amount)?;
        if amount > self.balance {
            return Err(PapertraderError::InsufficientFunds {
                requested: amount,
                balance: self.balance,
            });
        }
        let before = self.balance;
        self.balance -= amount;
        self.notify(CashEvent {
            event_type: CashEventType::Debit,
            amount,
            before,
            after: self.balance,
            date,
        });
        Ok(())
    }

    fn add(
        &mut self,
        event_type: CashEventType,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<(), PapertraderError> {
        check_amount(amount)?;
        let before = self.balance;
        self.balance += amount;
        self.notify(CashEvent {
            event_type,
            amount,
            before,
            after: self.balance,
            date,
        });
        Ok(())
    }

    fn notify(&self, event: CashEvent) {
        for listener in &self.listeners {
            listener.borrow_mut().cash_event(&event);
        }
    }
}

impl Default for CashAccount {
    fn default() -> Self {
        Self::new()
    }
}

fn check_amount(amount: Decimal) -> Result<(), PapertraderError> {
    if amount < Decimal::ZERO {
        return Err(PapertraderError::InvalidCashAmount { value: amount });
    }
    Ok(())
}
