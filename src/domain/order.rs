//! Orders and entry-size policy.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::equity::EquityOrderVolume;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderClass {
    Entry,
    Exit,
}

impl fmt::Display for OrderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderClass::Entry => write!(f, "entry"),
            OrderClass::Exit => write!(f, "exit"),
        }
    }
}

/// A single-day order: created by the decision engine, consumed immediately
/// by brokerage and cash, not retained past its execution day. `total_cost`
/// includes fees.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub class: OrderClass,
    pub total_cost: Decimal,
    pub volume: EquityOrderVolume,
    pub date: NaiveDate,
}

impl Order {
    pub fn entry(total_cost: Decimal, volume: EquityOrderVolume, date: NaiveDate) -> Self {
        Self {
            class: OrderClass::Entry,
            total_cost,
            volume,
            date,
        }
    }

    pub fn exit(total_cost: Decimal, volume: EquityOrderVolume, date: NaiveDate) -> Self {
        Self {
            class: OrderClass::Exit,
            total_cost,
            volume,
            date,
        }
    }
}

/// A position bound evaluated against the current cash balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashBound {
    Fixed(Decimal),
    Fraction(Decimal),
}

impl CashBound {
    pub fn evaluate(&self, cash_balance: Decimal) -> Decimal {
        match self {
            CashBound::Fixed(value) => *value,
            CashBound::Fraction(fraction) => cash_balance * fraction,
        }
    }
}

/// Converts available cash and configured bounds into an order value: the
/// largest affordable position bounded above by the maximum, or nothing at
/// all when the minimum cannot be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySizePolicy {
    minimum: CashBound,
    maximum: CashBound,
}

impl EntrySizePolicy {
    pub fn new(minimum: CashBound, maximum: CashBound) -> Self {
        Self { minimum, maximum }
    }

    pub fn size(&self, cash_balance: Decimal) -> Decimal {
        let min_position = self.minimum.evaluate(cash_balance);
        if cash_balance < min_position {
            return Decimal::ZERO;
        }
        let max_position = self.maximum.evaluate(cash_balance).max(min_position);
        cash_balance.min(max_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn below_minimum_yields_zero() {
        let policy = EntrySizePolicy::new(CashBound::Fixed(dec!(1000)), CashBound::Fixed(dec!(2000)));
        assert_eq!(policy.size(dec!(999.99)), dec!(0));
    }

    #[test]
    fn at_minimum_yields_balance() {
        let policy = EntrySizePolicy::new(CashBound::Fixed(dec!(1000)), CashBound::Fixed(dec!(2000)));
        assert_eq!(policy.size(dec!(1000)), dec!(1000));
    }

    #[test]
    fn maximum_caps_the_position() {
        let policy = EntrySizePolicy::new(CashBound::Fixed(dec!(1000)), CashBound::Fixed(dec!(2000)));
        assert_eq!(policy.size(dec!(5000)), dec!(2000));
    }

    #[test]
    fn fractional_bounds_follow_the_balance() {
        let policy = EntrySizePolicy::new(
            CashBound::Fraction(dec!(0.1)),
            CashBound::Fraction(dec!(0.5)),
        );
        // min = 400, max = 2000
        assert_eq!(policy.size(dec!(4000)), dec!(2000.0));
    }

    #[test]
    fn maximum_below_minimum_is_lifted_to_minimum() {
        let policy = EntrySizePolicy::new(CashBound::Fixed(dec!(1000)), CashBound::Fixed(dec!(500)));
        assert_eq!(policy.size(dec!(3000)), dec!(1000));
    }

    #[test]
    fn order_constructors_classify() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let volume = EquityOrderVolume::new(dec!(10)).unwrap();
        let entry = Order::entry(dec!(1000), volume.clone(), date);
        let exit = Order::exit(dec!(900), volume, date);
        assert_eq!(entry.class, OrderClass::Entry);
        assert_eq!(exit.class, OrderClass::Exit);
        assert_eq!(entry.class.to_string(), "entry");
        assert_eq!(exit.class.to_string(), "exit");
    }
}
