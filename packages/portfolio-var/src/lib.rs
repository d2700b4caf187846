//! Portfolio VaR - Value-at-Risk engine for a basket of priced holdings.
//!
//! This crate estimates the risk of a portfolio under three methodologies:
//!
//! - **Historical simulation**: per-instrument empirical return percentiles
//! - **Parametric (variance-covariance)**: normal quantile of portfolio volatility
//! - **Monte Carlo**: multivariate normal scenarios drawn from a seeded generator
//!
//! Price data comes from a [`provider::PriceProvider`]; fetch failures are absorbed into
//! empty series and surface later as [`Error::DataUnavailable`].
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use portfolio_var::provider::CsvProvider;
//! use portfolio_var::Portfolio;
//!
//! let mut portfolio = Portfolio::new();
//! portfolio.add_instrument("AAPL", 10.0);
//! portfolio.add_instrument("MSFT", 5.0);
//!
//! let provider = CsvProvider::new("prices/");
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
//! portfolio.fetch_all(&provider, start, end);
//!
//! let var = portfolio.model_building_var(0.95, 1.0)?;
//! println!("1-day 95% VaR: ${:.2}", var);
//! # Ok::<(), portfolio_var::Error>(())
//! ```

pub mod config;
pub mod instrument;
pub mod portfolio;
pub mod provider;
pub mod risk;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use types::{
    ApiResponse, DataGap, FetchStatus, InstrumentKind, PriceSeries, ReturnSeries, ValueHistory,
    VarMethod,
};

// Re-export main functionality
pub use config::Config;
pub use instrument::Instrument;
pub use portfolio::{Portfolio, ReturnTable, SharedPortfolio};
pub use provider::{PriceProvider, ProviderError};
pub use risk::{VarParams, VarReport};

/// Error types for portfolio-var operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Data unavailable for {method}: {gap}")]
    DataUnavailable { method: VarMethod, gap: DataGap },

    #[error("Degenerate state in {method}: {reason}")]
    DegenerateState { method: VarMethod, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for portfolio-var operations.
pub type Result<T> = std::result::Result<T, Error>;
