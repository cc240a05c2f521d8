//! Immutable event records and listener seams.
//!
//! Every state change in the ledger emits exactly one event carrying the
//! exact before/after balances: `after == before ± amount` holds for every
//! event kind, with no rounding drift. Listeners are notified synchronously,
//! in registration order, before the mutating call returns.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::order::OrderClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashEventType {
    Credit,
    Debit,
    Deposit,
}

impl fmt::Display for CashEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CashEventType::Credit => write!(f, "credit"),
            CashEventType::Debit => write!(f, "debit"),
            CashEventType::Deposit => write!(f, "deposit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashEvent {
    pub event_type: CashEventType,
    pub amount: Decimal,
    pub before: Decimal,
    pub after: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerageEventType {
    Buy,
    Sell,
}

impl fmt::Display for BrokerageEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerageEventType::Buy => write!(f, "buy"),
            BrokerageEventType::Sell => write!(f, "sell"),
        }
    }
}

/// Equity balance movement through a brokerage trade. `amount` is the
/// traded volume.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerageEvent {
    pub event_type: BrokerageEventType,
    pub amount: Decimal,
    pub before: Decimal,
    pub after: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquityEventType {
    ManagementFee,
}

impl fmt::Display for EquityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquityEventType::ManagementFee => write!(f, "management-fee"),
        }
    }
}

/// Equity balance reduction outside of trading, e.g. a management fee
/// charged against the holding itself.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityEvent {
    pub event_type: EquityEventType,
    pub amount: Decimal,
    pub before: Decimal,
    pub after: Decimal,
    pub date: NaiveDate,
}

/// Order execution against the cash ledger. `total_cost` includes fees;
/// `before`/`after` are the cash balances around the execution.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub class: OrderClass,
    pub total_cost: Decimal,
    pub before: Decimal,
    pub after: Decimal,
    pub date: NaiveDate,
}

pub trait CashEventListener {
    fn cash_event(&mut self, event: &CashEvent);
}

pub trait BrokerageEventListener {
    fn brokerage_event(&mut self, event: &BrokerageEvent);
}

pub trait EquityEventListener {
    fn equity_event(&mut self, event: &EquityEvent);
}

pub trait OrderEventListener {
    fn order_event(&mut self, event: &OrderEvent);
}
