//! Configuration validation.
//!
//! Validates every config field before a run; configuration-fatal conditions
//! surface here with the offending section/key named, so the simulation
//! itself only ever sees well-formed setups.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::brokerage::fees::FeeStructure;
use crate::domain::equity::EquityClass;
use crate::domain::error::PapertraderError;
use crate::domain::simulation::SimulationDates;
use crate::domain::strategy::validate_expr;
use crate::domain::strategy_parser;
use crate::ports::config_port::ConfigPort;

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    validate_ticker(config)?;
    validate_scale(config)?;
    validate_dates(config)?;
    validate_opening_funds(config)?;
    validate_fee_structure(config)?;
    validate_deposit(config)?;
    validate_entry_bounds(config)?;
    validate_management_fee(config)?;
    validate_strategy(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> PapertraderError {
    PapertraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> PapertraderError {
    PapertraderError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// Parse a decimal-valued key, if present.
pub fn get_decimal(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Decimal>, PapertraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => Decimal::from_str(raw.trim())
            .map(Some)
            .map_err(|_| invalid(section, key, format!("invalid decimal value '{}'", raw))),
    }
}

pub fn parse_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<NaiveDate, PapertraderError> {
    let raw = config
        .get_string(section, key)
        .ok_or_else(|| missing(section, key))?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(section, key, "invalid date format (expected YYYY-MM-DD)"))
}

fn validate_ticker(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    match config.get_string("simulation", "ticker") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(missing("simulation", "ticker")),
    }
}

fn validate_scale(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let scale = config.get_int("simulation", "scale", 0);
    if !(0..=8).contains(&scale) {
        return Err(invalid(
            "simulation",
            "scale",
            "scale must be between 0 and 8 decimal places",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let start = parse_date(config, "simulation", "start_date")?;
    let end = parse_date(config, "simulation", "end_date")?;
    SimulationDates::new(start, end)?;
    Ok(())
}

fn validate_opening_funds(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let funds = get_decimal(config, "simulation", "opening_funds")?
        .ok_or_else(|| missing("simulation", "opening_funds"))?;
    if funds < Decimal::ZERO {
        return Err(invalid(
            "simulation",
            "opening_funds",
            "opening_funds must be non-negative",
        ));
    }
    Ok(())
}

fn validate_fee_structure(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let name = config
        .get_string("brokerage", "fee_structure")
        .ok_or_else(|| missing("brokerage", "fee_structure"))?;
    let structure = FeeStructure::from_name(&name).ok_or_else(|| {
        invalid(
            "brokerage",
            "fee_structure",
            format!("unknown fee structure '{}'", name),
        )
    })?;

    let class_name = config
        .get_string("simulation", "equity_class")
        .unwrap_or_else(|| "stock".to_string());
    let class = EquityClass::from_name(&class_name).ok_or_else(|| {
        invalid(
            "simulation",
            "equity_class",
            format!("unknown equity class '{}'", class_name),
        )
    })?;

    let schedule = structure.schedule();
    if !schedule.supports(class) {
        return Err(PapertraderError::UnsupportedEquityClass {
            class: class.to_string(),
            structure: schedule.name().to_string(),
        });
    }
    Ok(())
}

fn validate_deposit(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let Some(amount) = get_decimal(config, "deposit", "amount")? else {
        return Ok(());
    };
    if amount < Decimal::ZERO {
        return Err(invalid("deposit", "amount", "amount must be non-negative"));
    }
    let frequency = config.get_int("deposit", "frequency_days", 7);
    if frequency < 1 {
        return Err(invalid(
            "deposit",
            "frequency_days",
            "frequency_days must be at least 1",
        ));
    }
    Ok(())
}

fn validate_entry_bounds(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    for key in ["minimum", "maximum"] {
        if let Some(value) = get_decimal(config, "entry", key)? {
            if value < Decimal::ZERO {
                return Err(invalid("entry", key, "bound must be non-negative"));
            }
        }
    }
    for key in ["minimum_fraction", "maximum_fraction"] {
        if let Some(value) = get_decimal(config, "entry", key)? {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(invalid("entry", key, "fraction must be between 0 and 1"));
            }
        }
    }
    for side in ["minimum", "maximum"] {
        let fixed = config.get_string("entry", side).is_some();
        let fraction = config
            .get_string("entry", &format!("{}_fraction", side))
            .is_some();
        if fixed && fraction {
            return Err(invalid(
                "entry",
                side,
                format!("{side} and {side}_fraction are mutually exclusive"),
            ));
        }
    }
    Ok(())
}

fn validate_management_fee(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let Some(rate) = get_decimal(config, "management_fee", "annual_rate")? else {
        return Ok(());
    };
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(invalid(
            "management_fee",
            "annual_rate",
            "annual_rate must be between 0 and 1",
        ));
    }
    let period = config.get_int("management_fee", "period_days", 365);
    if period < 1 {
        return Err(invalid(
            "management_fee",
            "period_days",
            "period_days must be at least 1",
        ));
    }
    let charge = config
        .get_string("management_fee", "charge")
        .unwrap_or_else(|| "cash".to_string());
    if !matches!(charge.to_lowercase().as_str(), "cash" | "equity") {
        return Err(invalid(
            "management_fee",
            "charge",
            format!("charge must be 'cash' or 'equity', not '{}'", charge),
        ));
    }
    Ok(())
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    for key in ["entry", "exit"] {
        let raw = config
            .get_string("strategy", key)
            .ok_or_else(|| missing("strategy", key))?;
        let expr = strategy_parser::parse(&raw)?;
        validate_expr(&expr)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID_INI: &str = r#"
[simulation]
ticker = BHP
scale = 0
start_date = 2022-01-01
end_date = 2024-12-31
opening_funds = 1000.00
equity_class = stock

[brokerage]
fee_structure = percentage

[deposit]
amount = 100.00
frequency_days = 7

[entry]
minimum = 500
maximum_fraction = 1.0

[management_fee]
annual_rate = 0.005
period_days = 90
charge = cash

[strategy]
name = weekly averaging
entry = confirmed(sma-gradient(20), rsi(14), 1, 3) or periodic(7)
exit = ema-gradient(50)
"#;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn replace_line(from: &str, to: &str) -> FileConfigAdapter {
        adapter(&VALID_INI.replace(from, to))
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_simulation_config(&adapter(VALID_INI)).is_ok());
    }

    #[test]
    fn missing_ticker_rejected() {
        let config = replace_line("ticker = BHP", "");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PapertraderError::ConfigMissing { key, .. } if key == "ticker"
        ));
    }

    #[test]
    fn end_before_start_rejected() {
        let config = replace_line("end_date = 2024-12-31", "end_date = 2021-12-31");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PapertraderError::InvalidSimulationDates { .. }
        ));
    }

    #[test]
    fn malformed_date_rejected() {
        let config = replace_line("start_date = 2022-01-01", "start_date = 01/01/2022");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PapertraderError::ConfigInvalid { key, .. } if key == "start_date"
        ));
    }

    #[test]
    fn negative_opening_funds_rejected() {
        let config = replace_line("opening_funds = 1000.00", "opening_funds = -1");
        assert!(validate_simulation_config(&config).is_err());
    }

    #[test]
    fn unknown_fee_structure_rejected() {
        let config = replace_line("fee_structure = percentage", "fee_structure = free");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PapertraderError::ConfigInvalid { key, .. } if key == "fee_structure"
        ));
    }

    #[test]
    fn unsupported_equity_class_rejected() {
        let config = replace_line("equity_class = stock", "equity_class = bond");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PapertraderError::UnsupportedEquityClass { .. }
        ));
    }

    #[test]
    fn conflicting_entry_bounds_rejected() {
        let config = replace_line("minimum = 500", "minimum = 500\nminimum_fraction = 0.5");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PapertraderError::ConfigInvalid { section, .. } if section == "entry"
        ));
    }

    #[test]
    fn out_of_range_management_rate_rejected() {
        let config = replace_line("annual_rate = 0.005", "annual_rate = 1.5");
        assert!(validate_simulation_config(&config).is_err());
    }

    #[test]
    fn unparseable_strategy_rejected() {
        let config = replace_line("exit = ema-gradient(50)", "exit = vwap(3)");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(err, PapertraderError::StrategyParse(_)));
    }

    #[test]
    fn semantically_invalid_strategy_rejected() {
        let config = replace_line("exit = ema-gradient(50)", "exit = macd(26, 12, 9)");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(err, PapertraderError::StrategyInvalid { .. }));
    }

    #[test]
    fn deposit_section_is_optional() {
        let config = adapter(
            &VALID_INI
                .replace("amount = 100.00", "")
                .replace("frequency_days = 7", ""),
        );
        assert!(validate_simulation_config(&config).is_ok());
    }
}
