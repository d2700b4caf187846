//! Portfolio aggregation.
//!
//! Provides the instrument book, value history, joint return table and a
//! lock-wrapped handle for concurrent callers.

mod holdings;
mod returns;
mod shared;

pub use holdings::Portfolio;
pub use returns::ReturnTable;
pub use shared::SharedPortfolio;
