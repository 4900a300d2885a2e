//! Ledger error taxonomy

use crate::custody::CustodyError;
use crate::position::PositionError;
use crate::types::{AccountId, MarketId};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by ledger operations
///
/// Every variant is returned before any state is applied, so a failed call
/// never leaves a partial mutation behind.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Question is empty or whitespace
    #[error("Question must not be empty")]
    InvalidQuestion,
    /// Duration is zero or overflows the timestamp range
    #[error("Invalid market duration: {0}s")]
    InvalidDuration(u64),
    #[error("Market {0} not found")]
    MarketNotFound(MarketId),
    #[error("Market {0} is not open")]
    MarketNotOpen(MarketId),
    #[error("Market {0} is not resolved")]
    MarketNotResolved(MarketId),
    /// Trading window has passed
    #[error("Betting closed for market {0}")]
    BettingClosed(MarketId),
    /// Resolution attempted before the end time
    #[error("Betting has not ended for market {0}")]
    BettingNotEnded(MarketId),
    #[error("Market {0} is not open: already resolved")]
    AlreadyResolved(MarketId),
    #[error("Amount must be greater than zero")]
    ZeroAmount,
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },
    #[error("No winning shares to claim")]
    NoWinningShares,
    #[error("Nothing to refund")]
    NothingToRefund,
    #[error("Caller {0} is not an authority")]
    Unauthorized(AccountId),
    #[error("Ledger is paused")]
    Paused,
    #[error("Arithmetic overflow")]
    Overflow,
    /// Custody collaborator rejected or failed the transfer
    #[error("Custody error: {0}")]
    Custody(#[from] CustodyError),
    #[error("Custody call timed out after {0:?}")]
    CustodyTimeout(Duration),
}

impl LedgerError {
    /// Whether the failure came from custody I/O rather than a business rule.
    /// Transient failures are safe for the caller to retry.
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::CustodyTimeout(_) => true,
            LedgerError::Custody(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Short label used for rejection metrics
    pub fn reason(&self) -> &'static str {
        match self {
            LedgerError::InvalidQuestion => "invalid_question",
            LedgerError::InvalidDuration(_) => "invalid_duration",
            LedgerError::MarketNotFound(_) => "market_not_found",
            LedgerError::MarketNotOpen(_) => "market_not_open",
            LedgerError::MarketNotResolved(_) => "market_not_resolved",
            LedgerError::BettingClosed(_) => "betting_closed",
            LedgerError::BettingNotEnded(_) => "betting_not_ended",
            LedgerError::AlreadyResolved(_) => "already_resolved",
            LedgerError::ZeroAmount => "zero_amount",
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::NoWinningShares => "no_winning_shares",
            LedgerError::NothingToRefund => "nothing_to_refund",
            LedgerError::Unauthorized(_) => "unauthorized",
            LedgerError::Paused => "paused",
            LedgerError::Overflow => "overflow",
            LedgerError::Custody(_) => "custody",
            LedgerError::CustodyTimeout(_) => "custody_timeout",
        }
    }
}

impl From<PositionError> for LedgerError {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::Insufficient {
                requested,
                available,
            } => LedgerError::InsufficientBalance {
                requested,
                available,
            },
            PositionError::Overflow => LedgerError::Overflow,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
