//! Historical-simulation VaR.

use tracing::debug;

use super::{check_confidence, check_horizon};
use crate::portfolio::Portfolio;
use crate::stats;
use crate::types::{DataGap, VarMethod};
use crate::{Error, Result};

impl Portfolio {
    /// Historical VaR over `time_horizon` days at `confidence`.
    ///
    /// Each instrument's loss is taken from the `(1 - confidence)` percentile of its
    /// own return history, scaled by `sqrt(time_horizon)`, and the losses are summed.
    /// Correlation between instruments is ignored, so the result is additive. The
    /// sum is not clamped and can be negative when the tail return is a gain.
    pub fn historical_var(&mut self, time_horizon: f64, confidence: f64) -> Result<f64> {
        const METHOD: VarMethod = VarMethod::Historical;
        check_confidence("confidence", confidence)?;
        check_horizon(time_horizon)?;
        self.prepare(METHOD)?;

        let loss_percentile = (1.0 - confidence) * 100.0;
        let scale = time_horizon.sqrt();

        let mut total = 0.0;
        for instrument in self.instruments() {
            let missing = || Error::DataUnavailable {
                method: METHOD,
                gap: DataGap::Returns(instrument.identifier().to_string()),
            };
            let returns: Vec<f64> = instrument.returns().values().copied().collect();
            let percentile_return =
                stats::percentile(&returns, loss_percentile).ok_or_else(missing)?;
            let last_price = instrument.last_price().ok_or_else(missing)?;

            let current_value = last_price * instrument.quantity();
            let projected_value = last_price * (1.0 + percentile_return) * instrument.quantity();
            let var = (current_value - projected_value) * scale;

            debug!(
                identifier = instrument.identifier(),
                percentile_return,
                var,
                "instrument historical VaR"
            );
            total += var;
        }

        Ok(total)
    }
}
