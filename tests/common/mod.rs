#![allow(dead_code)]

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use papertrader::domain::brokerage::fees::FeeStructure;
use papertrader::domain::equity::{EquityClass, EquityIdentity};
use papertrader::domain::error::PapertraderError;
use papertrader::domain::indicator::CalculationContext;
use papertrader::domain::management_fee::ManagementFeePolicy;
use papertrader::domain::order::{CashBound, EntrySizePolicy};
use papertrader::domain::price::TradingDayPrice;
use papertrader::domain::simulation::{
    DepositConfiguration, SimulationDates, SimulationSetup,
};
use papertrader::domain::strategy::Strategy;
use papertrader::domain::strategy_parser;
use papertrader::ports::data_port::PricePort;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub struct MockPricePort {
    pub data: HashMap<String, Vec<TradingDayPrice>>,
    pub errors: HashMap<String, String>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, ticker: &str, prices: Vec<TradingDayPrice>) -> Self {
        self.data.insert(ticker.to_string(), prices);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PricePort for MockPricePort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TradingDayPrice>, PapertraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(PapertraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|prices| {
                prices
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, PapertraderError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PapertraderError> {
        match self.data.get(ticker) {
            Some(prices) if !prices.is_empty() => Ok(Some((
                prices[0].date,
                prices[prices.len() - 1].date,
                prices.len(),
            ))),
            _ => Ok(None),
        }
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn make_price(d: NaiveDate, close: Decimal) -> TradingDayPrice {
    TradingDayPrice::new(d, close, close, close, close).unwrap()
}

/// Consecutive daily bars starting at `start`, one per close.
pub fn daily_prices(start: NaiveDate, closes: &[Decimal]) -> Vec<TradingDayPrice> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let d = start.checked_add_days(Days::new(i as u64)).unwrap();
            make_price(d, close)
        })
        .collect()
}

pub fn parse_strategy(name: &str, entry: &str, exit: &str) -> Strategy {
    Strategy {
        name: name.to_string(),
        entry: strategy_parser::parse(entry).unwrap(),
        exit: strategy_parser::parse(exit).unwrap(),
    }
}

/// A setup with sensible defaults: 1000 opening funds, percentage fees,
/// full-balance entries above a 100 minimum, no deposits, no management fee.
pub fn sample_setup(start: NaiveDate, end: NaiveDate, strategy: Strategy) -> SimulationSetup {
    SimulationSetup {
        identity: EquityIdentity::new("TEST", 0),
        equity_class: EquityClass::Stock,
        dates: SimulationDates::new(start, end).unwrap(),
        opening_funds: dec!(1000),
        deposit: DepositConfiguration::None,
        entry_policy: EntrySizePolicy::new(
            CashBound::Fixed(dec!(100)),
            CashBound::Fraction(dec!(1.0)),
        ),
        fee_structure: FeeStructure::Percentage,
        management_fee: ManagementFeePolicy::None,
        strategy,
        ctx: CalculationContext::default(),
    }
}
