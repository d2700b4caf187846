//! Market-data providers.
//!
//! The engine only needs [`PriceProvider::get_prices`]. Errors returned here stop at
//! [`crate::Instrument::fetch`], which logs them and stores an empty series.

mod csv_file;
#[cfg(feature = "yahoo")]
mod yahoo;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::{ProviderConfig, ProviderSource};
use crate::instrument::normalize_identifier;
use crate::types::PriceSeries;
use crate::{Error, Result};

pub use csv_file::CsvProvider;
#[cfg(feature = "yahoo")]
pub use yahoo::YahooProvider;

/// Errors raised at the market-data boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[cfg(feature = "yahoo")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No price data for {0}")]
    NotFound(String),

    #[error("Malformed price data: {0}")]
    Malformed(String),

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),
}

/// Result type for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Source of daily price history for an identifier.
pub trait PriceProvider: Send + Sync {
    /// Prices for every trading day in `[start, end]`, ordered by date.
    fn get_prices(
        &self,
        identifier: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<PriceSeries>;
}

/// In-memory provider backed by pre-loaded series.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    series: HashMap<String, PriceSeries>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`StaticProvider::insert`].
    pub fn with_series(mut self, identifier: &str, prices: PriceSeries) -> Self {
        self.insert(identifier, prices);
        self
    }

    /// Register (or replace) the series for an identifier.
    pub fn insert(&mut self, identifier: &str, prices: PriceSeries) {
        self.series.insert(normalize_identifier(identifier), prices);
    }
}

impl PriceProvider for StaticProvider {
    fn get_prices(
        &self,
        identifier: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<PriceSeries> {
        check_range(start, end)?;
        let prices = self
            .series
            .get(&normalize_identifier(identifier))
            .ok_or_else(|| ProviderError::NotFound(identifier.to_string()))?;

        Ok(prices
            .range(start..=end)
            .map(|(date, price)| (*date, *price))
            .collect())
    }
}

pub(crate) fn check_range(start: NaiveDate, end: NaiveDate) -> ProviderResult<()> {
    if start > end {
        return Err(ProviderError::Malformed(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}

/// Build the provider selected in the configuration.
pub fn provider_from_config(config: &ProviderConfig) -> Result<Box<dyn PriceProvider>> {
    match config.source {
        ProviderSource::Csv => {
            let dir = config.csv_dir.clone().ok_or_else(|| {
                Error::InvalidArgument("csv provider requires provider.csv_dir".to_string())
            })?;
            Ok(Box::new(CsvProvider::new(dir)))
        }
        #[cfg(feature = "yahoo")]
        ProviderSource::Yahoo => Ok(Box::new(YahooProvider::from_config(config)?)),
        #[cfg(not(feature = "yahoo"))]
        ProviderSource::Yahoo => Err(Error::InvalidArgument(
            "yahoo provider requires the `yahoo` feature".to_string(),
        )),
    }
}
