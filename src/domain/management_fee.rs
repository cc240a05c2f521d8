//! Equity management fee.
//!
//! A pure fee calculation invoked on schedule by the simulation loop (it is
//! not self-scheduling), applied either as a cash debit or as a reduction
//! of the equity count.

use rust_decimal::Decimal;

use crate::domain::indicator::CalculationContext;

pub const DAYS_PER_YEAR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);

/// Annual fee rate prorated over elapsed holding time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagementFeeRate {
    annual_rate: Decimal,
}

impl ManagementFeeRate {
    pub fn new(annual_rate: Decimal) -> Self {
        Self { annual_rate }
    }

    pub fn annual_rate(&self) -> Decimal {
        self.annual_rate
    }

    /// Fee on a holding of `equity_count` units at `unit_price` held for
    /// `elapsed_days`, rounded per the calculation context.
    pub fn calculate(
        &self,
        equity_count: Decimal,
        unit_price: Decimal,
        elapsed_days: i64,
        ctx: &CalculationContext,
    ) -> Decimal {
        if elapsed_days <= 0 {
            return Decimal::ZERO;
        }
        let holding = equity_count * unit_price;
        ctx.round(holding * self.annual_rate * Decimal::from(elapsed_days) / DAYS_PER_YEAR)
    }
}

/// Which balance a periodic management fee is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeAgainst {
    Cash,
    Equity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ManagementFeePolicy {
    None,
    Periodic {
        rate: ManagementFeeRate,
        period_days: u64,
        charge: ChargeAgainst,
    },
}
