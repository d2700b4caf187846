//! Monte Carlo VaR from multivariate normal return scenarios.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

use super::{check_confidence, check_horizon, zero_value};
use crate::portfolio::Portfolio;
use crate::stats;
use crate::types::{DataGap, VarMethod};
use crate::{Error, Result};

impl Portfolio {
    /// Monte Carlo VaR from `num_simulations` scenarios.
    ///
    /// Scenarios are drawn from N(mean returns, sample covariance) with `rng`, so a
    /// seeded generator gives reproducible results. Each scenario's portfolio return
    /// is scaled by `sqrt(time_horizon)`; the loss is read at the `1 - percentile`
    /// tail, with `percentile` a fraction such as 0.95.
    pub fn monte_carlo_var<R: Rng + ?Sized>(
        &mut self,
        num_simulations: usize,
        time_horizon: f64,
        percentile: f64,
        rng: &mut R,
    ) -> Result<f64> {
        const METHOD: VarMethod = VarMethod::MonteCarlo;
        if num_simulations == 0 {
            return Err(Error::InvalidArgument(
                "number of simulations must be positive".to_string(),
            ));
        }
        check_confidence("percentile", percentile)?;
        check_horizon(time_horizon)?;
        let current_value = self.prepare(METHOD)?;

        if current_value == 0.0 {
            return Err(zero_value(METHOD));
        }

        let weights = DVector::from_vec(self.weights(current_value));
        let means = DVector::from_vec(self.get_returns().mean_returns());
        let covariance = self
            .get_returns()
            .covariance()
            .map_err(|gap| Error::DataUnavailable { method: METHOD, gap })?;
        let factor = covariance_factor(&covariance);
        let scale = time_horizon.sqrt();

        let mut simulated = Vec::with_capacity(num_simulations);
        let mut shocks: DVector<f64> = DVector::zeros(means.len());
        for _ in 0..num_simulations {
            for shock in shocks.iter_mut() {
                *shock = StandardNormal.sample(&mut *rng);
            }
            let scenario = &means + &factor * &shocks;
            simulated.push(scenario.dot(&weights) * scale);
        }

        let tail_return = stats::percentile(&simulated, 100.0 - percentile * 100.0).ok_or(
            Error::DataUnavailable {
                method: METHOD,
                gap: DataGap::Portfolio,
            },
        )?;
        debug!(num_simulations, tail_return, "Monte Carlo tail return");

        let projected_value = current_value * (1.0 + tail_return);
        Ok(current_value - projected_value)
    }
}

/// Matrix square root `L` with `L Lᵀ = Σ`.
///
/// Cholesky when `Σ` is positive definite; otherwise the eigen-decomposition with
/// negative eigenvalues clamped to zero.
fn covariance_factor(covariance: &DMatrix<f64>) -> DMatrix<f64> {
    if let Some(cholesky) = covariance.clone().cholesky() {
        return cholesky.l();
    }

    let eigen = SymmetricEigen::new(covariance.clone());
    let roots = eigen.eigenvalues.map(|value| value.max(0.0).sqrt());
    eigen.eigenvectors * DMatrix::from_diagonal(&roots)
}
