//! Market store implementation

use super::{Market, MarketSnapshot};
use crate::error::{LedgerError, LedgerResult};
use crate::types::MarketId;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Exclusive handle to one market. Every mutating operation holds the lock
/// for its whole validate-settle-apply sequence.
pub type MarketSlot = Arc<Mutex<Market>>;

#[derive(Default)]
struct Inner {
    markets: HashMap<MarketId, MarketSlot>,
    last_id: u64,
}

/// Holds every market; markets are never deleted
pub struct MarketStore {
    inner: RwLock<Inner>,
}

impl MarketStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Validate and insert a new Open market, returning its sequential id
    pub async fn create(
        &self,
        question: &str,
        duration_seconds: u64,
        category: u32,
        now: DateTime<Utc>,
    ) -> LedgerResult<MarketId> {
        let (id, _) = self
            .create_locked(question, duration_seconds, category, now)
            .await?;
        Ok(id)
    }

    /// Like [`MarketStore::create`], but the slot is locked before it becomes
    /// visible. No other caller can touch the market until the guard drops.
    pub async fn create_locked(
        &self,
        question: &str,
        duration_seconds: u64,
        category: u32,
        now: DateTime<Utc>,
    ) -> LedgerResult<(MarketId, OwnedMutexGuard<Market>)> {
        let question = question.trim();
        if question.is_empty() {
            return Err(LedgerError::InvalidQuestion);
        }
        let end_time = end_time(now, duration_seconds)?;

        let mut inner = self.inner.write().await;
        let id = MarketId(inner.last_id.checked_add(1).ok_or(LedgerError::Overflow)?);
        inner.last_id = id.0;
        let market = Market::new(id, question.to_string(), category, now, end_time);
        let slot = Arc::new(Mutex::new(market));
        let guard = slot.clone().lock_owned().await;
        inner.markets.insert(id, slot);

        Ok((id, guard))
    }

    /// Look up the slot for a market
    pub async fn slot(&self, id: MarketId) -> LedgerResult<MarketSlot> {
        let inner = self.inner.read().await;
        inner
            .markets
            .get(&id)
            .cloned()
            .ok_or(LedgerError::MarketNotFound(id))
    }

    /// Consistent snapshot of one market
    pub async fn snapshot(&self, id: MarketId) -> LedgerResult<MarketSnapshot> {
        let slot = self.slot(id).await?;
        let market = slot.lock().await;
        Ok(market.snapshot())
    }

    /// Snapshots of every market, ordered by id
    pub async fn list(&self) -> Vec<MarketSnapshot> {
        let mut slots: Vec<(MarketId, MarketSlot)> = {
            let inner = self.inner.read().await;
            inner
                .markets
                .iter()
                .map(|(id, slot)| (*id, slot.clone()))
                .collect()
        };
        slots.sort_by_key(|(id, _)| *id);

        let mut snapshots = Vec::with_capacity(slots.len());
        for (_, slot) in slots {
            snapshots.push(slot.lock().await.snapshot());
        }
        snapshots
    }

    /// Number of markets ever created
    pub async fn len(&self) -> usize {
        self.inner.read().await.markets.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new()
    }
}

fn end_time(now: DateTime<Utc>, duration_seconds: u64) -> LedgerResult<DateTime<Utc>> {
    if duration_seconds == 0 {
        return Err(LedgerError::InvalidDuration(duration_seconds));
    }
    i64::try_from(duration_seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or(LedgerError::InvalidDuration(duration_seconds))
}
