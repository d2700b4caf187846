//! Lock-wrapped portfolio handle for concurrent callers.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rand::Rng;

use super::{Portfolio, ReturnTable};
use crate::provider::PriceProvider;
use crate::risk::{VarParams, VarReport};
use crate::types::{ValueHistory, VarMethod};
use crate::Result;

/// Cloneable handle to one [`Portfolio`].
///
/// Every method holds the lock for its whole merge -> recompute -> read sequence,
/// since the derived series are rebuilt in place.
#[derive(Debug, Clone, Default)]
pub struct SharedPortfolio {
    inner: Arc<Mutex<Portfolio>>,
}

impl SharedPortfolio {
    pub fn new(portfolio: Portfolio) -> Self {
        Self {
            inner: Arc::new(Mutex::new(portfolio)),
        }
    }

    /// Add a stock position; returns true when it merged into an existing one.
    pub fn add_instrument(&self, identifier: &str, quantity: f64) -> bool {
        self.inner.lock().add_instrument(identifier, quantity).1
    }

    /// Fetch prices for every instrument. Blocks for the duration of the fetch.
    pub fn fetch_all(&self, provider: &dyn PriceProvider, start: NaiveDate, end: NaiveDate) {
        self.inner.lock().fetch_all(provider, start, end);
    }

    /// Recomputed value history.
    pub fn value_history(&self) -> ValueHistory {
        self.inner.lock().compute_value_history().clone()
    }

    /// Recomputed return table.
    pub fn returns(&self) -> ReturnTable {
        self.inner.lock().compute_returns().clone()
    }

    pub fn var_report<R: Rng + ?Sized>(
        &self,
        method: VarMethod,
        params: &VarParams,
        rng: &mut R,
    ) -> Result<VarReport> {
        self.inner.lock().var_report(method, params, rng)
    }

    /// Run `f` with exclusive access.
    pub fn with<T>(&self, f: impl FnOnce(&mut Portfolio) -> T) -> T {
        f(&mut self.inner.lock())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticProvider;
    use crate::types::PriceSeries;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::thread;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, day).unwrap()
    }

    fn series(prices: &[f64]) -> PriceSeries {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| (date(i as u32 + 1), *p))
            .collect()
    }

    #[test]
    fn test_concurrent_adds_merge() {
        let shared = SharedPortfolio::default();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared.add_instrument("SPY", 1.0);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.len(), 1);
        let quantity = shared.with(|p| p.get("SPY").map(|i| i.quantity()));
        assert_eq!(quantity, Some(8.0));
    }

    #[test]
    fn test_fetch_on_worker_thread() {
        let provider = StaticProvider::new()
            .with_series("A", series(&[100.0, 102.0, 101.0, 103.0]))
            .with_series("B", series(&[50.0, 49.0, 51.0, 50.0]));
        let shared = SharedPortfolio::default();
        shared.add_instrument("A", 10.0);
        shared.add_instrument("B", 20.0);

        let worker = shared.clone();
        thread::spawn(move || worker.fetch_all(&provider, date(1), date(31)))
            .join()
            .unwrap();

        let values: Vec<f64> = shared.value_history().values().copied().collect();
        assert_eq!(values, vec![2000.0, 2000.0, 2030.0, 2030.0]);
        assert_eq!(shared.returns().len(), 3);

        let report = shared
            .var_report(
                VarMethod::Historical,
                &VarParams::default(),
                &mut StdRng::seed_from_u64(0),
            )
            .unwrap();
        assert_eq!(report.portfolio_value, 2030.0);
    }
}
