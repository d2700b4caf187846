//! Value-at-Risk estimators on [`Portfolio`].
//!
//! Each estimator recomputes the portfolio's derived series before reading them,
//! so callers only need to fetch prices first. All three use the same sorted
//! instrument order for weights, means and covariance.

mod historical;
mod monte_carlo;
mod parametric;

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::portfolio::Portfolio;
use crate::types::{DataGap, VarMethod};
use crate::{Error, Result};

/// Inputs shared by the three estimators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VarParams {
    /// Confidence level in (0, 1), e.g. 0.95
    pub confidence: f64,
    /// Horizon in days, scaled by its square root
    pub time_horizon: f64,
    /// Scenario count for Monte Carlo
    pub num_simulations: usize,
}

impl Default for VarParams {
    fn default() -> Self {
        Self {
            confidence: 0.95,
            time_horizon: 1.0,
            num_simulations: 10_000,
        }
    }
}

/// Outcome of a single VaR run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VarReport {
    pub method: VarMethod,
    pub confidence: f64,
    pub time_horizon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_simulations: Option<usize>,
    /// Estimated loss in portfolio currency
    pub value: f64,
    /// Latest total portfolio value
    pub portfolio_value: f64,
    /// Date of the latest valuation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

impl VarReport {
    /// VaR as a percentage of portfolio value (0 for a zero-value portfolio).
    pub fn percent_of_value(&self) -> f64 {
        if self.portfolio_value == 0.0 {
            return 0.0;
        }
        self.value / self.portfolio_value * 100.0
    }
}

impl Portfolio {
    /// Run one estimator and package the result.
    ///
    /// Monte Carlo uses `params.confidence` as its percentile.
    pub fn var_report<R: Rng + ?Sized>(
        &mut self,
        method: VarMethod,
        params: &VarParams,
        rng: &mut R,
    ) -> Result<VarReport> {
        let value = match method {
            VarMethod::Historical => self.historical_var(params.time_horizon, params.confidence)?,
            VarMethod::Parametric => {
                self.model_building_var(params.confidence, params.time_horizon)?
            }
            VarMethod::MonteCarlo => self.monte_carlo_var(
                params.num_simulations,
                params.time_horizon,
                params.confidence,
                rng,
            )?,
        };

        Ok(VarReport {
            method,
            confidence: params.confidence,
            time_horizon: params.time_horizon,
            num_simulations: (method == VarMethod::MonteCarlo).then_some(params.num_simulations),
            value,
            portfolio_value: self.current_value().unwrap_or(0.0),
            as_of: self.as_of(),
        })
    }

    /// Recompute derived series and check every instrument can take part.
    ///
    /// Every instrument needs prices and returns, all finite. Returns the latest
    /// portfolio value.
    fn prepare(&mut self, method: VarMethod) -> Result<f64> {
        self.compute_value_history();
        self.compute_returns();

        let current_value = self.current_value().ok_or(Error::DataUnavailable {
            method,
            gap: DataGap::Portfolio,
        })?;

        for instrument in self.instruments() {
            let gap = if instrument.prices().is_empty() {
                DataGap::Prices(instrument.identifier().to_string())
            } else if instrument.returns().is_empty() {
                DataGap::Returns(instrument.identifier().to_string())
            } else if !is_finite_series(instrument.prices().values())
                || !is_finite_series(instrument.returns().values())
            {
                DataGap::NonFinite(instrument.identifier().to_string())
            } else {
                continue;
            };
            return Err(Error::DataUnavailable { method, gap });
        }

        Ok(current_value)
    }
}

fn is_finite_series<'a>(mut values: impl Iterator<Item = &'a f64>) -> bool {
    values.all(|value| value.is_finite())
}

fn check_confidence(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(Error::InvalidArgument(format!(
            "{} must be in (0, 1), got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_horizon(time_horizon: f64) -> Result<()> {
    if !(time_horizon.is_finite() && time_horizon >= 0.0) {
        return Err(Error::InvalidArgument(format!(
            "time horizon must be a non-negative number of days, got {}",
            time_horizon
        )));
    }
    Ok(())
}

fn zero_value(method: VarMethod) -> Error {
    Error::DegenerateState {
        method,
        reason: "portfolio value is zero".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;
    use crate::types::PriceSeries;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn series(prices: &[f64]) -> PriceSeries {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| (NaiveDate::from_ymd_opt(2024, 6, i as u32 + 1).unwrap(), *p))
            .collect()
    }

    fn portfolio() -> Portfolio {
        let mut portfolio = Portfolio::new();
        let a = series(&[100.0, 102.0, 101.0, 103.0, 99.0, 100.0]);
        let b = series(&[50.0, 49.0, 51.0, 50.0, 52.0, 51.0]);
        portfolio.add(Instrument::with_prices("A", 10.0, a));
        portfolio.add(Instrument::with_prices("B", 20.0, b));
        portfolio
    }

    #[test]
    fn test_var_report_fields() {
        let mut portfolio = portfolio();
        let mut rng = StdRng::seed_from_u64(1);
        let params = VarParams {
            num_simulations: 2_000,
            ..VarParams::default()
        };

        let report = portfolio
            .var_report(VarMethod::Parametric, &params, &mut rng)
            .unwrap();
        assert_eq!(report.method, VarMethod::Parametric);
        assert_eq!(report.portfolio_value, 2020.0);
        assert_eq!(report.num_simulations, None);
        assert_eq!(report.as_of, NaiveDate::from_ymd_opt(2024, 6, 6));
        assert!(report.value > 0.0);
        assert!(report.percent_of_value() > 0.0);

        let report = portfolio
            .var_report(VarMethod::MonteCarlo, &params, &mut rng)
            .unwrap();
        assert_eq!(report.num_simulations, Some(2_000));
    }

    #[test]
    fn test_prepare_names_instrument_without_returns() {
        let mut portfolio = portfolio();
        portfolio.add(Instrument::with_prices("C", 1.0, series(&[10.0])));

        let err = portfolio.historical_var(1.0, 0.95).unwrap_err();
        assert!(matches!(
            err,
            Error::DataUnavailable {
                method: VarMethod::Historical,
                gap: DataGap::Returns(ref id),
            } if id == "C"
        ));
    }

    #[test]
    fn test_prepare_names_instrument_without_prices() {
        let mut portfolio = portfolio();
        portfolio.add_instrument("D", 1.0);

        let err = portfolio.model_building_var(0.95, 1.0).unwrap_err();
        assert!(matches!(
            err,
            Error::DataUnavailable { gap: DataGap::Prices(ref id), .. } if id == "D"
        ));
        assert!(err.to_string().contains("D"));
    }

    #[test]
    fn test_non_finite_returns_rejected_by_every_method() {
        let mut portfolio = portfolio();
        portfolio.add(Instrument::with_prices("Z", 5.0, series(&[0.0, 1.0, 2.0, 1.5])));
        let mut rng = StdRng::seed_from_u64(3);

        let results = [
            portfolio.historical_var(1.0, 0.95),
            portfolio.model_building_var(0.95, 1.0),
            portfolio.monte_carlo_var(1_000, 1.0, 0.95, &mut rng),
        ];
        for result in results {
            assert!(matches!(
                result,
                Err(Error::DataUnavailable { gap: DataGap::NonFinite(ref id), .. }) if id == "Z"
            ));
        }
    }

    #[test]
    fn test_nan_price_rejected() {
        let mut portfolio = portfolio();
        portfolio.add(Instrument::with_prices("N", 1.0, series(&[10.0, f64::NAN, 11.0])));

        let err = portfolio.model_building_var(0.95, 1.0).unwrap_err();
        assert!(matches!(
            err,
            Error::DataUnavailable { gap: DataGap::NonFinite(ref id), .. } if id == "N"
        ));
    }

    #[test]
    fn test_invalid_arguments() {
        let mut portfolio = portfolio();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(
            portfolio.historical_var(1.0, 1.0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            portfolio.model_building_var(0.0, 1.0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            portfolio.model_building_var(0.95, -1.0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            portfolio.monte_carlo_var(0, 1.0, 0.95, &mut rng),
            Err(Error::InvalidArgument(_))
        ));
    }
}
