//! Fee treasury
//!
//! Single running accumulator of skimmed fees, swept to the authority on
//! request. The accumulator is wider than a transfer so accruing a fee can
//! never fail after the collateral leg has already settled.

use crate::custody::{settle, Custody};
use crate::error::LedgerResult;
use crate::telemetry::{increment, set_gauge, CounterMetric, GaugeMetric};
use crate::types::AccountId;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::Mutex;

/// Lifetime treasury figures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreasuryStats {
    /// Unswept balance
    pub balance: u128,
    /// Every fee ever accrued
    pub collected: u128,
    /// Every fee ever swept
    pub withdrawn: u128,
}

/// Accumulator of collected fees
pub struct FeeTreasury {
    state: Mutex<TreasuryStats>,
}

impl FeeTreasury {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TreasuryStats::default()),
        }
    }

    /// Add a skimmed fee
    pub async fn accrue(&self, fee: u64) {
        if fee == 0 {
            return;
        }
        let mut state = self.state.lock().await;
        state.balance += u128::from(fee);
        state.collected += u128::from(fee);
        increment(CounterMetric::FeesCollected, fee);
        set_gauge(GaugeMetric::TreasuryBalance, state.balance as f64);
    }

    /// Current unswept balance
    pub async fn balance(&self) -> u128 {
        self.state.lock().await.balance
    }

    pub async fn stats(&self) -> TreasuryStats {
        *self.state.lock().await
    }

    /// Transfer the accumulated balance to `to` and reset it.
    ///
    /// A zero balance returns 0 without touching custody. The lock is held
    /// across the custody call so a concurrent accrue waits rather than being
    /// lost, and a failed transfer leaves the balance untouched.
    pub async fn withdraw(
        &self,
        to: &AccountId,
        custody: &dyn Custody,
        timeout: Duration,
    ) -> LedgerResult<u64> {
        let mut state = self.state.lock().await;
        // Anything above a single transfer stays for the next sweep.
        let amount = u64::try_from(state.balance).unwrap_or(u64::MAX);
        if amount == 0 {
            return Ok(0);
        }

        settle(timeout, custody.credit(to, amount)).await?;

        state.balance -= u128::from(amount);
        state.withdrawn += u128::from(amount);
        increment(CounterMetric::FeesWithdrawn, amount);
        set_gauge(GaugeMetric::TreasuryBalance, state.balance as f64);
        Ok(amount)
    }
}

impl Default for FeeTreasury {
    fn default() -> Self {
        Self::new()
    }
}
