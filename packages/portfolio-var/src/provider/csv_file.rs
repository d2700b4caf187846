//! Price history from per-identifier CSV files.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::{check_range, PriceProvider, ProviderError, ProviderResult};
use crate::instrument::normalize_identifier;
use crate::types::PriceSeries;

/// Header names accepted for the price column, most preferred first.
const PRICE_COLUMNS: [&str; 5] = ["adj close", "adj_close", "adjclose", "price", "close"];

/// Reads `<dir>/<IDENTIFIER>.csv` files with a `date` column and a price column.
///
/// Dates are `YYYY-MM-DD`. Empty or `null` price cells are skipped.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding prices for `identifier`.
    pub fn path_for(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", normalize_identifier(identifier)))
    }
}

impl PriceProvider for CsvProvider {
    fn get_prices(
        &self,
        identifier: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<PriceSeries> {
        check_range(start, end)?;

        let path = self.path_for(identifier);
        if !path.exists() {
            return Err(ProviderError::NotFound(identifier.to_string()));
        }

        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(&path)?;
        let headers = reader.headers()?.clone();

        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let date_idx = find("date").ok_or_else(|| {
            ProviderError::Malformed(format!("{}: missing date column", path.display()))
        })?;
        let price_idx = PRICE_COLUMNS
            .iter()
            .find_map(|name| find(*name))
            .ok_or_else(|| {
                ProviderError::Malformed(format!("{}: missing price column", path.display()))
            })?;

        let mut prices = PriceSeries::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let raw_date = record.get(date_idx).unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
                ProviderError::Malformed(format!("{} row {}: {}", path.display(), line + 2, e))
            })?;
            if date < start || date > end {
                continue;
            }

            let raw_price = record.get(price_idx).unwrap_or_default();
            if raw_price.is_empty() || raw_price.eq_ignore_ascii_case("null") {
                continue;
            }
            let price: f64 = raw_price.parse().map_err(|_| {
                ProviderError::Malformed(format!(
                    "{} row {}: invalid price {:?}",
                    path.display(),
                    line + 2,
                    raw_price
                ))
            })?;
            prices.insert(date, price);
        }

        Ok(prices)
    }
}
