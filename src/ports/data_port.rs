//! Price retrieval port trait.
//!
//! Historical price retrieval lives behind this trait, including any
//! provider rate limiting, retry, or parallel fetching. The simulation core
//! only ever consumes a fully assembled, date-ascending sequence.

use chrono::NaiveDate;

use crate::domain::error::PapertraderError;
use crate::domain::price::TradingDayPrice;

pub trait PricePort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TradingDayPrice>, PapertraderError>;

    fn list_tickers(&self) -> Result<Vec<String>, PapertraderError>;

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PapertraderError>;
}
