//! Position ledger
//!
//! Per-(market, side, account) balance storage with cached side totals.
//! Pure bookkeeping: no market status, timing, or fee rules live here.

mod book;

pub use book::{BalanceUpdate, PositionBook};

use thiserror::Error;

/// Position bookkeeping errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// Debit larger than the current balance
    #[error("Insufficient position: requested {requested}, available {available}")]
    Insufficient { requested: u64, available: u64 },
    /// Balance or side total would overflow
    #[error("Position overflow")]
    Overflow,
}
