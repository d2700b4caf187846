//! Variance-covariance (model-building) VaR.

use nalgebra::DVector;
use tracing::debug;

use super::{check_confidence, check_horizon, zero_value};
use crate::portfolio::Portfolio;
use crate::stats;
use crate::types::VarMethod;
use crate::{Error, Result};

impl Portfolio {
    /// Parametric VaR at `confidence` over `time_horizon` days.
    ///
    /// `|z(1 - confidence) * sqrt(wᵀ Σ w) * value * sqrt(time_horizon)|`, where `Σ` is the
    /// sample covariance of the return table and `w` the latest weights. Always
    /// non-negative.
    pub fn model_building_var(&mut self, confidence: f64, time_horizon: f64) -> Result<f64> {
        const METHOD: VarMethod = VarMethod::Parametric;
        check_confidence("confidence", confidence)?;
        check_horizon(time_horizon)?;
        let portfolio_value = self.prepare(METHOD)?;

        let covariance = self
            .get_returns()
            .covariance()
            .map_err(|gap| Error::DataUnavailable { method: METHOD, gap })?;

        if portfolio_value == 0.0 {
            return Err(zero_value(METHOD));
        }

        let weights = DVector::from_vec(self.weights(portfolio_value));
        let variance = weights.dot(&(&covariance * &weights));
        let volatility = variance.max(0.0).sqrt();
        let z = stats::normal_quantile(1.0 - confidence)?;

        debug!(portfolio_value, volatility, z, "model-building VaR inputs");

        Ok((z * volatility * portfolio_value * time_horizon.sqrt()).abs())
    }
}
