//! Joint return table across instruments.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::stats;
use crate::types::{DataGap, ReturnSeries};

/// Returns of every instrument, outer-aligned on date.
///
/// Columns follow `identifiers` (sorted). A row holds only the instruments that
/// have a return on that date; missing cells are absent, not zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReturnTable {
    identifiers: Vec<String>,
    rows: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

impl ReturnTable {
    /// Build from `(identifier, returns)` columns. Column order is sorted by identifier.
    pub fn from_columns<'a, I>(columns: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a ReturnSeries)>,
    {
        let mut identifiers = Vec::new();
        let mut rows: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();

        for (identifier, returns) in columns {
            identifiers.push(identifier.to_string());
            for (date, value) in returns {
                rows.entry(*date)
                    .or_default()
                    .insert(identifier.to_string(), *value);
            }
        }
        identifiers.sort();
        identifiers.dedup();

        Self { identifiers, rows }
    }

    /// Column identifiers, in matrix order.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Date -> {identifier -> return}.
    pub fn rows(&self) -> &BTreeMap<NaiveDate, BTreeMap<String, f64>> {
        &self.rows
    }

    pub fn get(&self, date: NaiveDate, identifier: &str) -> Option<f64> {
        self.rows.get(&date)?.get(identifier).copied()
    }

    /// Defined values of one column, in date order.
    pub fn column(&self, identifier: &str) -> Vec<f64> {
        self.rows
            .values()
            .filter_map(|row| row.get(identifier).copied())
            .collect()
    }

    /// Number of dated rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Per-column mean over the defined cells. NaN for an empty column.
    pub fn mean_returns(&self) -> Vec<f64> {
        self.identifiers
            .iter()
            .map(|id| stats::mean(&self.column(id)).unwrap_or(f64::NAN))
            .collect()
    }

    /// Sample covariance matrix, each pair over the dates both columns define.
    ///
    /// Fails with [`DataGap::Overlap`] when a pair shares fewer than two dates.
    pub fn covariance(&self) -> Result<DMatrix<f64>, DataGap> {
        let n = self.identifiers.len();
        let mut matrix = DMatrix::zeros(n, n);

        for i in 0..n {
            for j in i..n {
                let (a, b) = (&self.identifiers[i], &self.identifiers[j]);
                let (xs, ys): (Vec<f64>, Vec<f64>) = self
                    .rows
                    .values()
                    .filter_map(|row| Some((*row.get(a)?, *row.get(b)?)))
                    .unzip();

                let cov = stats::sample_covariance(&xs, &ys)
                    .ok_or_else(|| DataGap::Overlap(a.clone(), b.clone()))?;
                matrix[(i, j)] = cov;
                matrix[(j, i)] = cov;
            }
        }

        Ok(matrix)
    }
}
