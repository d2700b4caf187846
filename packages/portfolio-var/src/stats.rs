//! Sample statistics used by the VaR estimators.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::{Error, Result};

/// Empirical percentile with linear interpolation between order statistics.
///
/// `q` is on the 0-100 scale and is clamped to it. Returns `None` for an empty sample.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Arithmetic mean. `None` for an empty sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample covariance (n - 1 denominator) of two equally long samples.
///
/// Returns `None` when fewer than two observations are available.
pub fn sample_covariance(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }

    let mean_x = mean(&xs[..n])?;
    let mean_y = mean(&ys[..n])?;

    let sum = xs[..n]
        .iter()
        .zip(&ys[..n])
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>();

    Some(sum / (n - 1) as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    sample_covariance(values, values).map(f64::sqrt)
}

/// Standard normal quantile function.
pub fn normal_quantile(p: f64) -> Result<f64> {
    let normal = Normal::new(0.0, 1.0).map_err(|e| Error::InvalidArgument(e.to_string()))?;
    Ok(normal.inverse_cdf(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_percentile_interpolates() {
        let values = vec![4.0, 1.0, 3.0, 2.0, 5.0];

        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        // rank = 0.1 * 4 = 0.4 -> 1 + 0.4 * (2 - 1)
        assert_abs_diff_eq!(percentile(&values, 10.0).unwrap(), 1.4, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_single_value() {
        assert_eq!(percentile(&[0.02], 5.0), Some(0.02));
    }

    #[test]
    fn test_percentile_empty() {
        assert_eq!(percentile(&[], 5.0), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_sample_covariance() {
        let xs = vec![1.0, 2.0, 3.0, 4.0];
        let ys = vec![2.0, 4.0, 6.0, 8.0];

        // var(xs) = 1.6667, cov = 2 * var(xs)
        assert_abs_diff_eq!(
            sample_covariance(&xs, &xs).unwrap(),
            5.0 / 3.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            sample_covariance(&xs, &ys).unwrap(),
            10.0 / 3.0,
            epsilon = 1e-12
        );
        assert_eq!(sample_covariance(&[1.0], &[2.0]), None);
    }

    #[test]
    fn test_std_dev() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // Sample variance = 32 / 7
        assert_abs_diff_eq!(
            std_dev(&values).unwrap(),
            (32.0_f64 / 7.0).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_normal_quantile() {
        assert_abs_diff_eq!(normal_quantile(0.5).unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(normal_quantile(0.95).unwrap(), 1.644854, epsilon = 1e-5);
        assert_abs_diff_eq!(normal_quantile(0.05).unwrap(), -1.644854, epsilon = 1e-5);
        assert_abs_diff_eq!(normal_quantile(0.99).unwrap(), 2.326348, epsilon = 1e-5);
    }
}
