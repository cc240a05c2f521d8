//! CSV file price adapter.
//!
//! Reads `TICKER.csv` files with a `date,open,high,low,close` header from a
//! base directory. Prices parse as exact decimals.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;
use crate::domain::price::TradingDayPrice;
use crate::ports::data_port::PricePort;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    fn read_all(&self, ticker: &str) -> Result<Vec<TradingDayPrice>, PapertraderError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| PapertraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut prices = Vec::new();

        for result in reader.records() {
            let record = result.map_err(|e| PapertraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(0).ok_or_else(|| PapertraderError::Data {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                PapertraderError::Data {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            let mut fields = [Decimal::ZERO; 4];
            for (offset, name) in ["open", "high", "low", "close"].iter().enumerate() {
                let raw = record
                    .get(offset + 1)
                    .ok_or_else(|| PapertraderError::Data {
                        reason: format!("missing {} column", name),
                    })?;
                fields[offset] = Decimal::from_str(raw.trim()).map_err(|e| {
                    PapertraderError::Data {
                        reason: format!("invalid {} value: {}", name, e),
                    }
                })?;
            }

            prices.push(TradingDayPrice::new(
                date, fields[0], fields[1], fields[2], fields[3],
            )?);
        }

        prices.sort_by_key(|p| p.date);
        Ok(prices)
    }
}

impl PricePort for CsvPriceAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TradingDayPrice>, PapertraderError> {
        let mut prices = self.read_all(ticker)?;
        prices.retain(|p| p.date >= start_date && p.date <= end_date);
        Ok(prices)
    }

    fn list_tickers(&self) -> Result<Vec<String>, PapertraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| PapertraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PapertraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PapertraderError> {
        let prices = self.read_all(ticker)?;
        match (prices.first(), prices.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, prices.len()))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close\n\
            2024-01-16,105.0,115.0,100.0,110.00\n\
            2024-01-15,100.0,110.0,90.0,105.50\n\
            2024-01-17,110.0,120.0,105.0,115.25\n";
        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("CBA.csv"), "date,open,high,low,close\n").unwrap();

        (dir, path)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn fetch_prices_sorts_and_parses_decimals() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let prices = adapter.fetch_prices("BHP", date(15), date(17)).unwrap();
        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0].date, date(15));
        assert_eq!(prices[0].close, dec!(105.50));
        assert_eq!(prices[2].close, dec!(115.25));
    }

    #[test]
    fn fetch_prices_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let prices = adapter.fetch_prices("BHP", date(16), date(16)).unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].date, date(16));
    }

    #[test]
    fn fetch_prices_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert!(matches!(
            adapter.fetch_prices("XYZ", date(1), date(31)),
            Err(PapertraderError::Data { .. })
        ));
    }

    #[test]
    fn list_tickers_finds_csv_files() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert_eq!(adapter.list_tickers().unwrap(), vec!["BHP", "CBA"]);
    }

    #[test]
    fn data_range_reports_span() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert_eq!(
            adapter.data_range("BHP").unwrap(),
            Some((date(15), date(17), 3))
        );
        assert_eq!(adapter.data_range("CBA").unwrap(), None);
    }

    #[test]
    fn malformed_price_is_a_data_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "date,open,high,low,close\n2024-01-15,xx,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvPriceAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_prices("BAD", date(1), date(31)),
            Err(PapertraderError::Data { .. })
        ));
    }
}
