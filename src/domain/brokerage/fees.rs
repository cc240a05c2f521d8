//! Brokerage fee schedules.
//!
//! Fees are tiered by trade count within the current calendar month; each
//! tier charges max(flat fee, trade value x percentage rate). The set of
//! schedules is a closed mapping from the configuration enum.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::equity::EquityClass;

/// One fee bracket. Applies from `first_trade` (1-based ordinal within the
/// month) until the next tier takes over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeTier {
    pub first_trade: u32,
    pub flat: Decimal,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSchedule {
    name: &'static str,
    tiers: Vec<FeeTier>,
    supported: &'static [EquityClass],
}

impl FeeSchedule {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn supports(&self, class: EquityClass) -> bool {
        self.supported.contains(&class)
    }

    /// Fee for a trade of `trade_value`, the `trade_number`-th this month.
    /// Pure; the product is exact decimal arithmetic with no rounding.
    pub fn cost(&self, trade_value: Decimal, trade_number: u32) -> Decimal {
        let Some(tier) = self
            .tiers
            .iter()
            .rev()
            .find(|tier| tier.first_trade <= trade_number)
        else {
            return Decimal::ZERO;
        };
        let percentage = trade_value * tier.rate;
        if tier.flat > percentage {
            tier.flat
        } else {
            percentage
        }
    }
}

/// Closed set of configurable fee structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeStructure {
    /// 0.08% of trade value, no flat floor, every trade.
    Percentage,
    /// Flat-or-percentage brackets stepping down with monthly trade count.
    TieredPerTrade,
}

impl FeeStructure {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "percentage" => Some(FeeStructure::Percentage),
            "tiered" => Some(FeeStructure::TieredPerTrade),
            _ => None,
        }
    }

    pub fn schedule(self) -> FeeSchedule {
        match self {
            FeeStructure::Percentage => FeeSchedule {
                name: "percentage",
                tiers: vec![FeeTier {
                    first_trade: 1,
                    flat: Decimal::ZERO,
                    rate: dec!(0.0008),
                }],
                supported: &[EquityClass::Stock, EquityClass::Etf],
            },
            FeeStructure::TieredPerTrade => FeeSchedule {
                name: "tiered",
                tiers: vec![
                    FeeTier {
                        first_trade: 1,
                        flat: dec!(11.00),
                        rate: dec!(0.0010),
                    },
                    FeeTier {
                        first_trade: 11,
                        flat: dec!(9.90),
                        rate: dec!(0.0008),
                    },
                    FeeTier {
                        first_trade: 31,
                        flat: dec!(9.90),
                        rate: dec!(0.00075),
                    },
                ],
                supported: &[EquityClass::Stock, EquityClass::Etf],
            },
        }
    }
}

impl fmt::Display for FeeStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeStructure::Percentage => write!(f, "percentage"),
            FeeStructure::TieredPerTrade => write!(f, "tiered"),
        }
    }
}
