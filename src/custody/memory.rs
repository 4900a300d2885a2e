//! In-memory custody with simulated transfers

use super::{Custody, CustodyError};
use crate::types::AccountId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Direction of a custody transfer, seen from the participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    /// Collateral moved into custody
    Debit,
    /// Collateral paid out of custody
    Credit,
}

/// A settled transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub account: AccountId,
    pub direction: TransferDirection,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
}

/// Custody simulator holding external balances in memory
pub struct InMemoryCustody {
    balances: Arc<RwLock<HashMap<AccountId, u64>>>,
    transfers: Arc<RwLock<Vec<Transfer>>>,
    offline: AtomicBool,
    latency: Option<Duration>,
}

impl InMemoryCustody {
    /// Create an empty custody simulator
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            transfers: Arc::new(RwLock::new(vec![])),
            offline: AtomicBool::new(false),
            latency: None,
        }
    }

    /// Delay every transfer by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Give an account external collateral
    pub async fn fund(&self, account: &AccountId, amount: u64) {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(account.clone()).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// External balance of an account
    pub async fn balance(&self, account: &AccountId) -> u64 {
        let balances = self.balances.read().await;
        balances.get(account).copied().unwrap_or(0)
    }

    /// Make every subsequent transfer fail with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// All settled transfers in order
    pub async fn transfers(&self) -> Vec<Transfer> {
        let transfers = self.transfers.read().await;
        transfers.clone()
    }

    async fn simulate_io(&self) -> Result<(), CustodyError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(CustodyError::Unavailable("custody offline".to_string()));
        }
        Ok(())
    }

    async fn log_transfer(&self, account: &AccountId, direction: TransferDirection, amount: u64) {
        let mut transfers = self.transfers.write().await;
        transfers.push(Transfer {
            account: account.clone(),
            direction,
            amount,
            timestamp: Utc::now(),
        });
    }
}

impl Default for InMemoryCustody {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Custody for InMemoryCustody {
    async fn debit(&self, account: &AccountId, amount: u64) -> Result<(), CustodyError> {
        self.simulate_io().await?;

        {
            let mut balances = self.balances.write().await;
            let available = balances.get(account).copied().unwrap_or(0);
            let remaining =
                available
                    .checked_sub(amount)
                    .ok_or_else(|| CustodyError::InsufficientFunds {
                        account: account.clone(),
                        requested: amount,
                        available,
                    })?;
            balances.insert(account.clone(), remaining);
        }

        self.log_transfer(account, TransferDirection::Debit, amount)
            .await;
        tracing::debug!(%account, amount, "Custody debit settled");
        Ok(())
    }

    async fn credit(&self, account: &AccountId, amount: u64) -> Result<(), CustodyError> {
        self.simulate_io().await?;

        {
            let mut balances = self.balances.write().await;
            let balance = balances.entry(account.clone()).or_insert(0);
            *balance = balance
                .checked_add(amount)
                .ok_or_else(|| CustodyError::Rejected("balance overflow".to_string()))?;
        }

        self.log_transfer(account, TransferDirection::Credit, amount)
            .await;
        tracing::debug!(%account, amount, "Custody credit settled");
        Ok(())
    }
}
