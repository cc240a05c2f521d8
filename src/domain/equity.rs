//! Equity identity, class, and order volume types.

use std::fmt;

use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;

/// Identifies the single equity a simulation runs over.
///
/// `scale` is the number of decimal places the equity trades in; order
/// volumes are truncated to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquityIdentity {
    pub ticker: String,
    pub scale: u32,
}

impl EquityIdentity {
    pub fn new(ticker: impl Into<String>, scale: u32) -> Self {
        Self {
            ticker: ticker.into(),
            scale,
        }
    }
}

/// Closed set of equity classifications a fee schedule can support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquityClass {
    Stock,
    Etf,
    Bond,
}

impl EquityClass {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "stock" => Some(EquityClass::Stock),
            "etf" => Some(EquityClass::Etf),
            "bond" => Some(EquityClass::Bond),
            _ => None,
        }
    }
}

impl fmt::Display for EquityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquityClass::Stock => write!(f, "stock"),
            EquityClass::Etf => write!(f, "etf"),
            EquityClass::Bond => write!(f, "bond"),
        }
    }
}

/// A non-negative equity volume. Construction from a negative value is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquityOrderVolume(Decimal);

impl EquityOrderVolume {
    pub fn new(value: Decimal) -> Result<Self, PapertraderError> {
        if value < Decimal::ZERO {
            return Err(PapertraderError::InvalidOrderVolume { value });
        }
        Ok(Self(value))
    }

    /// Build a volume by truncating toward zero at the equity's trading scale.
    pub fn truncated(value: Decimal, scale: u32) -> Result<Self, PapertraderError> {
        Self::new(value.trunc_with_scale(scale))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn identity_fields() {
        let identity = EquityIdentity::new("BHP", 0);
        assert_eq!(identity.ticker, "BHP");
        assert_eq!(identity.scale, 0);
    }

    #[test]
    fn class_from_name_is_case_insensitive() {
        assert_eq!(EquityClass::from_name("Stock"), Some(EquityClass::Stock));
        assert_eq!(EquityClass::from_name("ETF"), Some(EquityClass::Etf));
        assert_eq!(EquityClass::from_name("bond"), Some(EquityClass::Bond));
        assert_eq!(EquityClass::from_name("warrant"), None);
    }

    #[test]
    fn class_display_round_trips() {
        for class in [EquityClass::Stock, EquityClass::Etf, EquityClass::Bond] {
            assert_eq!(EquityClass::from_name(&class.to_string()), Some(class));
        }
    }

    #[test]
    fn volume_rejects_negative() {
        let err = EquityOrderVolume::new(dec!(-1)).unwrap_err();
        assert!(matches!(err, PapertraderError::InvalidOrderVolume { .. }));
    }

    #[test]
    fn volume_accepts_zero() {
        let volume = EquityOrderVolume::new(dec!(0)).unwrap();
        assert!(volume.is_zero());
    }

    #[test]
    fn truncated_drops_sub_scale_digits() {
        let volume = EquityOrderVolume::truncated(dec!(12.987), 2).unwrap();
        assert_eq!(volume.value(), dec!(12.98));

        let whole = EquityOrderVolume::truncated(dec!(12.987), 0).unwrap();
        assert_eq!(whole.value(), dec!(12));
    }
}
