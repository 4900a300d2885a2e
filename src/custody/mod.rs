//! Collateral custody collaborator
//!
//! The ledger never holds raw collateral. It asks a custody service to debit
//! a participant on acquire and to credit them on release, claim, refund, or
//! fee sweep, and keeps only the per-market vault accounting itself.

mod memory;

pub use memory::{InMemoryCustody, Transfer, TransferDirection};

use crate::error::{LedgerError, LedgerResult};
use crate::telemetry::{record_latency, LatencyMetric};
use crate::types::AccountId;
use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors reported by a custody service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    /// Account cannot cover the debit
    #[error("Account {account} has insufficient collateral: requested {requested}, available {available}")]
    InsufficientFunds {
        account: AccountId,
        requested: u64,
        available: u64,
    },
    /// Transfer refused for a reason other than funds
    #[error("Transfer rejected: {0}")]
    Rejected(String),
    /// Service unreachable or failing; safe to retry
    #[error("Custody unavailable: {0}")]
    Unavailable(String),
}

impl CustodyError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CustodyError::Unavailable(_))
    }
}

/// Trait for custody service implementations
#[async_trait]
pub trait Custody: Send + Sync {
    /// Move `amount` of the account's external collateral into custody
    async fn debit(&self, account: &AccountId, amount: u64) -> Result<(), CustodyError>;
    /// Pay `amount` of collateral out of custody to the account
    async fn credit(&self, account: &AccountId, amount: u64) -> Result<(), CustodyError>;
}

/// Run a custody call under the configured timeout.
///
/// A timeout is reported as [`LedgerError::CustodyTimeout`]; the caller must
/// not apply any state in that case.
pub(crate) async fn settle<F>(timeout: Duration, call: F) -> LedgerResult<()>
where
    F: Future<Output = Result<(), CustodyError>>,
{
    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, call).await;
    record_latency(LatencyMetric::Custody, started.elapsed());

    match outcome {
        Ok(result) => result.map_err(LedgerError::from),
        Err(_) => {
            tracing::warn!(?timeout, "Custody call timed out");
            Err(LedgerError::CustodyTimeout(timeout))
        }
    }
}
