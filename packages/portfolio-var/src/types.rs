//! Core data types shared by the instrument, portfolio and risk modules.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily prices keyed by calendar date.
pub type PriceSeries = BTreeMap<NaiveDate, f64>;

/// Simple per-period returns keyed by the date closing the period.
pub type ReturnSeries = BTreeMap<NaiveDate, f64>;

/// Total portfolio value keyed by date.
pub type ValueHistory = BTreeMap<NaiveDate, f64>;

/// How an instrument obtains its price history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    /// Exchange-traded, priced through the configured provider.
    #[default]
    Stock,
    /// No pricing source yet; fetch leaves the series empty.
    Bond,
    /// No pricing source yet; fetch leaves the series empty.
    Swap,
}

impl InstrumentKind {
    /// Whether `fetch` has a pricing source for this kind.
    pub fn is_priced(&self) -> bool {
        matches!(self, InstrumentKind::Stock)
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentKind::Stock => write!(f, "stock"),
            InstrumentKind::Bond => write!(f, "bond"),
            InstrumentKind::Swap => write!(f, "swap"),
        }
    }
}

/// Outcome of the most recent price fetch for an instrument.
///
/// Separates "never fetched" from "fetched but empty", which both leave the
/// price series empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    #[default]
    NotFetched,
    Fetched {
        points: usize,
    },
    Failed {
        reason: String,
    },
    Unsupported,
}

impl FetchStatus {
    /// True once `fetch` has been called, whatever the outcome.
    pub fn is_attempted(&self) -> bool {
        !matches!(self, FetchStatus::NotFetched)
    }
}

/// VaR methodology.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum VarMethod {
    Historical,
    Parametric,
    MonteCarlo,
}

impl VarMethod {
    pub const ALL: [VarMethod; 3] = [
        VarMethod::Historical,
        VarMethod::Parametric,
        VarMethod::MonteCarlo,
    ];
}

impl fmt::Display for VarMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarMethod::Historical => write!(f, "historical VaR"),
            VarMethod::Parametric => write!(f, "model-building VaR"),
            VarMethod::MonteCarlo => write!(f, "Monte Carlo VaR"),
        }
    }
}

/// What was missing when a VaR computation could not run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "missing", content = "identifiers", rename_all = "snake_case")]
pub enum DataGap {
    /// No instrument has any price data (or the portfolio is empty).
    Portfolio,
    /// The instrument has no prices.
    Prices(String),
    /// The instrument has fewer than two prices, so no returns.
    Returns(String),
    /// Two instruments share fewer than two return dates.
    Overlap(String, String),
    /// The instrument has a NaN or infinite price or return (e.g. a zero price).
    NonFinite(String),
}

impl fmt::Display for DataGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataGap::Portfolio => write!(f, "no price data has been fetched for the portfolio"),
            DataGap::Prices(id) => write!(f, "price series is empty for instrument {}", id),
            DataGap::Returns(id) => write!(f, "return series is empty for instrument {}", id),
            DataGap::Overlap(a, b) => write!(
                f,
                "instruments {} and {} share fewer than two return dates",
                a, b
            ),
            DataGap::NonFinite(id) => {
                write!(f, "instrument {} has a non-finite price or return", id)
            }
        }
    }
}

/// API response wrapper used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
