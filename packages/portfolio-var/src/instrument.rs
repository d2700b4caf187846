//! Priced positions and their derived return series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::provider::PriceProvider;
use crate::types::{FetchStatus, InstrumentKind, PriceSeries, ReturnSeries};

/// A single holding: identifier, signed quantity and price history.
///
/// The return series is derived and only ever rebuilt from the prices via
/// [`Instrument::compute_returns`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    /// Ticker or other unique key (uppercase)
    identifier: String,
    /// How prices are obtained
    kind: InstrumentKind,
    /// Amount held; negative for short positions
    quantity: f64,
    /// Daily prices
    prices: PriceSeries,
    /// Simple returns derived from `prices`
    #[serde(skip)]
    returns: ReturnSeries,
    /// Outcome of the last fetch
    fetch_status: FetchStatus,
}

impl Instrument {
    /// Create a stock position with no price data.
    pub fn new(identifier: &str, quantity: f64) -> Self {
        Self::with_kind(identifier, InstrumentKind::Stock, quantity)
    }

    /// Create a position of the given kind with no price data.
    pub fn with_kind(identifier: &str, kind: InstrumentKind, quantity: f64) -> Self {
        Self {
            identifier: normalize_identifier(identifier),
            kind,
            quantity,
            prices: PriceSeries::new(),
            returns: ReturnSeries::new(),
            fetch_status: FetchStatus::NotFetched,
        }
    }

    /// Create a stock position from prices the caller already holds.
    pub fn with_prices(identifier: &str, quantity: f64, prices: PriceSeries) -> Self {
        let points = prices.len();
        Self {
            prices,
            fetch_status: FetchStatus::Fetched { points },
            ..Self::new(identifier, quantity)
        }
    }

    /// Load prices for `[start, end]`.
    ///
    /// Provider failures are logged and leave an empty series; they are reported
    /// later by the VaR methods, never here. Kinds without a pricing source are a no-op.
    pub fn fetch(
        &mut self,
        provider: &dyn PriceProvider,
        start: NaiveDate,
        end: NaiveDate,
    ) -> &PriceSeries {
        match self.kind {
            InstrumentKind::Stock => match provider.get_prices(&self.identifier, start, end) {
                Ok(prices) => {
                    debug!(
                        identifier = %self.identifier,
                        points = prices.len(),
                        "fetched prices"
                    );
                    self.fetch_status = FetchStatus::Fetched {
                        points: prices.len(),
                    };
                    self.prices = prices;
                }
                Err(e) => {
                    warn!(identifier = %self.identifier, error = %e, "price fetch failed");
                    self.fetch_status = FetchStatus::Failed {
                        reason: e.to_string(),
                    };
                    self.prices.clear();
                }
            },
            InstrumentKind::Bond | InstrumentKind::Swap => {
                debug!(
                    identifier = %self.identifier,
                    kind = %self.kind,
                    "no pricing source for instrument kind"
                );
                self.fetch_status = FetchStatus::Unsupported;
                self.prices.clear();
            }
        }
        &self.prices
    }

    /// Add `delta` to the quantity held. Any sign is accepted.
    pub fn update_quantity(&mut self, delta: f64) {
        self.quantity += delta;
    }

    /// Rebuild the return series as `price[t] / price[t-1] - 1`.
    ///
    /// The first period has no return, so the series is one shorter than the prices
    /// (and empty for fewer than two prices).
    pub fn compute_returns(&mut self) -> &ReturnSeries {
        self.returns = self
            .prices
            .iter()
            .zip(self.prices.iter().skip(1))
            .map(|((_, previous), (date, price))| (*date, price / previous - 1.0))
            .collect();
        &self.returns
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> InstrumentKind {
        self.kind
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn prices(&self) -> &PriceSeries {
        &self.prices
    }

    /// Returns as of the last [`Instrument::compute_returns`] call.
    pub fn returns(&self) -> &ReturnSeries {
        &self.returns
    }

    pub fn fetch_status(&self) -> &FetchStatus {
        &self.fetch_status
    }

    /// Most recent price, if any.
    pub fn last_price(&self) -> Option<f64> {
        self.prices.values().next_back().copied()
    }

    /// Value of the holding at the most recent price.
    pub fn market_value(&self) -> Option<f64> {
        self.last_price().map(|price| price * self.quantity)
    }
}

/// Identifiers are compared case-insensitively, stored uppercase.
pub(crate) fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderError, ProviderResult, StaticProvider};
    use approx::assert_abs_diff_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn series(prices: &[f64]) -> PriceSeries {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| (date(i as u32 + 1), *p))
            .collect()
    }

    struct FailingProvider;

    impl PriceProvider for FailingProvider {
        fn get_prices(
            &self,
            identifier: &str,
            _: NaiveDate,
            _: NaiveDate,
        ) -> ProviderResult<PriceSeries> {
            Err(ProviderError::NotFound(identifier.to_string()))
        }
    }

    #[test]
    fn test_new_instrument() {
        let instrument = Instrument::new(" aapl ", 10.0);
        assert_eq!(instrument.identifier(), "AAPL");
        assert_eq!(instrument.kind(), InstrumentKind::Stock);
        assert_eq!(instrument.quantity(), 10.0);
        assert!(instrument.prices().is_empty());
        assert_eq!(instrument.fetch_status(), &FetchStatus::NotFetched);
        assert!(instrument.last_price().is_none());
    }

    #[test]
    fn test_compute_returns() {
        let mut instrument =
            Instrument::with_prices("A", 10.0, series(&[100.0, 102.0, 101.0, 103.0]));
        let returns: Vec<f64> = instrument.compute_returns().values().copied().collect();

        assert_eq!(returns.len(), 3);
        assert_abs_diff_eq!(returns[0], 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(returns[1], -0.00980, epsilon = 1e-5);
        assert_abs_diff_eq!(returns[2], 0.01980, epsilon = 1e-5);

        // Dated by the closing day of each period
        assert_eq!(instrument.returns().keys().next(), Some(&date(2)));
    }

    #[test]
    fn test_compute_returns_short_series() {
        let mut instrument = Instrument::with_prices("A", 1.0, series(&[100.0]));
        assert!(instrument.compute_returns().is_empty());

        let mut empty = Instrument::new("B", 1.0);
        assert!(empty.compute_returns().is_empty());
    }

    #[test]
    fn test_update_quantity_allows_shorts() {
        let mut instrument = Instrument::new("A", 10.0);
        instrument.update_quantity(5.0);
        assert_eq!(instrument.quantity(), 15.0);

        instrument.update_quantity(-20.0);
        assert_eq!(instrument.quantity(), -5.0);
    }

    #[test]
    fn test_fetch_stock() {
        let provider = StaticProvider::new().with_series("A", series(&[10.0, 11.0, 12.0]));
        let mut instrument = Instrument::new("a", 1.0);

        let prices = instrument.fetch(&provider, date(1), date(2));
        assert_eq!(prices.len(), 2);
        assert_eq!(instrument.fetch_status(), &FetchStatus::Fetched { points: 2 });
        assert_eq!(instrument.last_price(), Some(11.0));
        assert_eq!(instrument.market_value(), Some(11.0));
    }

    #[test]
    fn test_fetch_failure_is_absorbed() {
        let mut instrument = Instrument::with_prices("A", 1.0, series(&[10.0, 11.0]));

        let prices = instrument.fetch(&FailingProvider, date(1), date(2));
        assert!(prices.is_empty());
        assert!(matches!(
            instrument.fetch_status(),
            FetchStatus::Failed { reason } if reason.contains('A')
        ));
    }

    #[test]
    fn test_fetch_unsupported_kind() {
        let provider = StaticProvider::new().with_series("UST10Y", series(&[99.0, 98.5]));
        let mut bond = Instrument::with_kind("UST10Y", InstrumentKind::Bond, 1.0);

        assert!(bond.fetch(&provider, date(1), date(2)).is_empty());
        assert_eq!(bond.fetch_status(), &FetchStatus::Unsupported);
    }
}
