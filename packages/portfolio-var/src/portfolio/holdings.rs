//! The instrument book and its derived value/return aggregates.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::ReturnTable;
use crate::instrument::{normalize_identifier, Instrument};
use crate::provider::PriceProvider;
use crate::types::{FetchStatus, ValueHistory};

/// A collection of instruments keyed by identifier.
///
/// Instruments iterate in sorted identifier order; weights, return-table columns and
/// covariance rows all share that order. `value_history` and `return_table` are only
/// valid right after `compute_value_history` / `compute_returns`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Portfolio {
    instruments: BTreeMap<String, Instrument>,
    value_history: ValueHistory,
    return_table: ReturnTable,
}

impl Portfolio {
    /// Create a new empty portfolio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instrument, merging into an existing one with the same identifier.
    ///
    /// On merge only the quantity is carried over; the incoming instrument's price
    /// data is discarded. Returns the stored instrument and whether it was a merge.
    pub fn add(&mut self, instrument: Instrument) -> (&Instrument, bool) {
        match self.instruments.entry(instrument.identifier().to_string()) {
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                existing.update_quantity(instrument.quantity());
                (&*existing, true)
            }
            Entry::Vacant(entry) => (&*entry.insert(instrument), false),
        }
    }

    /// Add a stock position by identifier and quantity.
    pub fn add_instrument(&mut self, identifier: &str, quantity: f64) -> (&Instrument, bool) {
        self.add(Instrument::new(identifier, quantity))
    }

    /// Fetch prices for every instrument over the same range.
    ///
    /// Individual failures leave that instrument's series empty and are not raised.
    pub fn fetch_all(&mut self, provider: &dyn PriceProvider, start: NaiveDate, end: NaiveDate) {
        for instrument in self.instruments.values_mut() {
            instrument.fetch(provider, start, end);
        }

        let failed = self
            .instruments
            .values()
            .filter(|i| matches!(i.fetch_status(), FetchStatus::Failed { .. }))
            .count();
        info!(
            instruments = self.instruments.len(),
            failed,
            %start,
            %end,
            "fetched portfolio prices"
        );
    }

    /// Alias of [`Portfolio::fetch_all`].
    pub fn fetch_all_data(
        &mut self,
        provider: &dyn PriceProvider,
        start: NaiveDate,
        end: NaiveDate,
    ) {
        self.fetch_all(provider, start, end);
    }

    /// Recompute total value per date over the union of instrument dates.
    ///
    /// An instrument without a price on a date contributes nothing to that date.
    pub fn compute_value_history(&mut self) -> &ValueHistory {
        let mut history = ValueHistory::new();
        for instrument in self.instruments.values() {
            for (date, price) in instrument.prices() {
                *history.entry(*date).or_insert(0.0) += price * instrument.quantity();
            }
        }
        debug!(points = history.len(), "recomputed value history");

        self.value_history = history;
        &self.value_history
    }

    /// Recompute every instrument's returns and the joint return table.
    pub fn compute_returns(&mut self) -> &ReturnTable {
        for instrument in self.instruments.values_mut() {
            instrument.compute_returns();
        }
        self.return_table = ReturnTable::from_columns(
            self.instruments
                .values()
                .map(|i| (i.identifier(), i.returns())),
        );
        debug!(rows = self.return_table.len(), "recomputed return table");

        &self.return_table
    }

    /// Weight of each instrument at its latest price, in sorted identifier order.
    ///
    /// `last_price * quantity / portfolio_value`; an instrument with no prices weighs 0.
    pub fn weights(&self, portfolio_value: f64) -> Vec<f64> {
        self.instruments
            .values()
            .map(|i| i.market_value().unwrap_or(0.0) / portfolio_value)
            .collect()
    }

    /// Value history as of the last recomputation.
    pub fn get_value_history(&self) -> &ValueHistory {
        &self.value_history
    }

    /// Return table as of the last recomputation.
    pub fn get_returns(&self) -> &ReturnTable {
        &self.return_table
    }

    /// Latest total value as of the last recomputation.
    pub fn current_value(&self) -> Option<f64> {
        self.value_history.values().next_back().copied()
    }

    /// Date of the latest value as of the last recomputation.
    pub fn as_of(&self) -> Option<NaiveDate> {
        self.value_history.keys().next_back().copied()
    }

    /// Find an instrument by identifier (case insensitive).
    pub fn get(&self, identifier: &str) -> Option<&Instrument> {
        self.instruments.get(&normalize_identifier(identifier))
    }

    /// Instruments in sorted identifier order.
    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }

    /// Get the number of instruments.
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}
