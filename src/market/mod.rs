//! Market store
//!
//! Market records (question, timing, status, vault) and their position books,
//! one exclusive slot per market.

mod store;

pub use store::{MarketSlot, MarketStore};

use crate::error::{LedgerError, LedgerResult};
use crate::position::PositionBook;
use crate::types::{MarketId, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a market. Both terminal variants are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum MarketStatus {
    /// Accepting trades until the end time
    Open,
    /// Outcome declared by the authority
    Resolved {
        outcome: Side,
        resolved_at: DateTime<Utc>,
    },
    /// Withdrawn by the authority; holders are refunded
    Cancelled { cancelled_at: DateTime<Utc> },
}

/// Status without its payload, for snapshots and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Open,
    Resolved,
    Cancelled,
}

impl MarketStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            MarketStatus::Open => StatusKind::Open,
            MarketStatus::Resolved { .. } => StatusKind::Resolved,
            MarketStatus::Cancelled { .. } => StatusKind::Cancelled,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, MarketStatus::Open)
    }
}

/// Invariant check failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// Cached side total disagrees with the sum of balances
    #[error("Market {market} {side} total {cached} != sum of balances {recomputed}")]
    TotalMismatch {
        market: MarketId,
        side: Side,
        cached: u64,
        recomputed: u128,
    },
    /// Vault cannot cover what it owes
    #[error("Market {market} vault {vault} below obligations {obligations}")]
    Insolvent {
        market: MarketId,
        vault: u64,
        obligations: u128,
    },
}

/// A market record together with its position book
#[derive(Debug, Clone)]
pub struct Market {
    id: MarketId,
    question: String,
    category: u32,
    created_at: DateTime<Utc>,
    end_time: DateTime<Utc>,
    pub(crate) status: MarketStatus,
    /// Collateral held on behalf of this market
    pub(crate) vault: u64,
    pub(crate) book: PositionBook,
}

impl Market {
    pub(crate) fn new(
        id: MarketId,
        question: String,
        category: u32,
        created_at: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            question,
            category,
            created_at,
            end_time,
            status: MarketStatus::Open,
            vault: 0,
            book: PositionBook::new(),
        }
    }

    pub fn id(&self) -> MarketId {
        self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn category(&self) -> u32 {
        self.category
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn status(&self) -> MarketStatus {
        self.status
    }

    pub fn vault(&self) -> u64 {
        self.vault
    }

    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    /// Outstanding position total on one side
    pub fn total(&self, side: Side) -> u64 {
        self.book.side_total(side)
    }

    /// Fails with `MarketNotOpen` unless the market is Open
    pub fn ensure_open(&self) -> LedgerResult<()> {
        match self.status {
            MarketStatus::Open => Ok(()),
            MarketStatus::Resolved { .. } | MarketStatus::Cancelled { .. } => {
                Err(LedgerError::MarketNotOpen(self.id))
            }
        }
    }

    /// Whether the trading window is still open at `now`
    pub fn accepts_trades(&self, now: DateTime<Utc>) -> bool {
        now < self.end_time
    }

    /// Verify that cached totals match the book and the vault is solvent
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for side in Side::BOTH {
            let cached = self.book.side_total(side);
            let recomputed = self.book.recomputed_total(side);
            if u128::from(cached) != recomputed {
                return Err(InvariantViolation::TotalMismatch {
                    market: self.id,
                    side,
                    cached,
                    recomputed,
                });
            }
        }

        // Losing balances are forfeit once resolved; only winners are owed.
        let obligations = match self.status {
            MarketStatus::Open | MarketStatus::Cancelled { .. } => {
                u128::from(self.total(Side::Yes)) + u128::from(self.total(Side::No))
            }
            MarketStatus::Resolved { outcome, .. } => u128::from(self.total(outcome)),
        };
        if u128::from(self.vault) < obligations {
            return Err(InvariantViolation::Insolvent {
                market: self.id,
                vault: self.vault,
                obligations,
            });
        }

        Ok(())
    }

    /// Read-only view of the market
    pub fn snapshot(&self) -> MarketSnapshot {
        let (outcome, resolution_time) = match self.status {
            MarketStatus::Open => (None, None),
            MarketStatus::Resolved {
                outcome,
                resolved_at,
            } => (Some(outcome.as_outcome()), Some(resolved_at)),
            MarketStatus::Cancelled { cancelled_at } => (None, Some(cancelled_at)),
        };

        MarketSnapshot {
            id: self.id,
            question: self.question.clone(),
            category: self.category,
            created_at: self.created_at,
            end_time: self.end_time,
            resolution_time,
            status: self.status.kind(),
            outcome,
            total_yes: self.total(Side::Yes),
            total_no: self.total(Side::No),
            vault: self.vault,
        }
    }
}

/// Snapshot returned by `get_market`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub id: MarketId,
    pub question: String,
    pub category: u32,
    pub created_at: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Resolution or cancellation time, once terminal
    pub resolution_time: Option<DateTime<Utc>>,
    pub status: StatusKind,
    /// `Some(true)` when YES won; absent unless resolved
    pub outcome: Option<bool>,
    pub total_yes: u64,
    pub total_no: u64,
    pub vault: u64,
}

impl MarketSnapshot {
    /// Share of outstanding positions on YES, for display only.
    /// `None` while nothing is outstanding.
    pub fn yes_probability(&self) -> Option<Decimal> {
        let yes = Decimal::from(self.total_yes);
        let total = yes + Decimal::from(self.total_no);
        if total.is_zero() {
            return None;
        }
        Some(yes / total)
    }
}
