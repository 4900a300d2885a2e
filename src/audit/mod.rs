//! Audit log
//!
//! Append-only record of every state change, kept in memory and optionally
//! streamed to a JSON-lines file for replay and debugging. Not needed for
//! correctness: the ledger state is authoritative.

mod recorder;
mod replay;

pub use recorder::{AuditRecorder, RecorderConfig, RecorderStats, MAX_FLUSH_INTERVAL_SECS};
pub use replay::{read_events, ReplayMarket, ReplayState, ReplayViolation};

use crate::types::{AccountId, MarketId, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    MarketCreated {
        market: MarketId,
        question: String,
        category: u32,
        end_time: DateTime<Utc>,
    },
    Acquired {
        market: MarketId,
        account: AccountId,
        side: Side,
        amount: u64,
        credited: u64,
        fee: u64,
    },
    Released {
        market: MarketId,
        account: AccountId,
        side: Side,
        amount: u64,
        payout: u64,
        fee: u64,
    },
    Resolved {
        market: MarketId,
        outcome: Side,
    },
    Cancelled {
        market: MarketId,
    },
    Claimed {
        market: MarketId,
        account: AccountId,
        side: Side,
        payout: u64,
    },
    Refunded {
        market: MarketId,
        account: AccountId,
        yes: u64,
        no: u64,
    },
    FeesWithdrawn {
        to: AccountId,
        amount: u64,
    },
    Paused {
        by: AccountId,
    },
    Unpaused {
        by: AccountId,
    },
}

impl EventKind {
    /// Market the event belongs to, if any
    pub fn market(&self) -> Option<MarketId> {
        match self {
            EventKind::MarketCreated { market, .. }
            | EventKind::Acquired { market, .. }
            | EventKind::Released { market, .. }
            | EventKind::Resolved { market, .. }
            | EventKind::Cancelled { market }
            | EventKind::Claimed { market, .. }
            | EventKind::Refunded { market, .. } => Some(*market),
            EventKind::FeesWithdrawn { .. } | EventKind::Paused { .. } | EventKind::Unpaused { .. } => {
                None
            }
        }
    }
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub id: Uuid,
    /// Position in the log, starting at 1
    pub sequence: u64,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Events a sink-backed log keeps in memory; the file holds the rest
pub const DEFAULT_SINK_RETENTION: usize = 1_024;

#[derive(Default)]
struct Retained {
    events: VecDeque<LedgerEvent>,
    recorded: u64,
}

/// Append-only audit trail
pub struct AuditLog {
    inner: RwLock<Retained>,
    /// Upper bound on events held in memory; unbounded when `None`
    retention: Option<usize>,
    sink: Option<mpsc::Sender<LedgerEvent>>,
}

impl AuditLog {
    /// In-memory log only. Keeps every event.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Retained::default()),
            retention: None,
            sink: None,
        }
    }

    /// Log that forwards every event to a recorder and keeps only the most
    /// recent [`DEFAULT_SINK_RETENTION`] in memory
    pub fn with_sink(sink: mpsc::Sender<LedgerEvent>) -> Self {
        Self {
            inner: RwLock::new(Retained::default()),
            retention: Some(DEFAULT_SINK_RETENTION),
            sink: Some(sink),
        }
    }

    /// Cap the number of events held in memory
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Append an event. Callers record while still holding the market lock,
    /// so per-market order in the log matches the order of application.
    pub async fn record(&self, at: DateTime<Utc>, kind: EventKind) -> LedgerEvent {
        let event = {
            let mut inner = self.inner.write().await;
            inner.recorded += 1;
            let event = LedgerEvent {
                id: Uuid::new_v4(),
                sequence: inner.recorded,
                at,
                kind,
            };
            inner.events.push_back(event.clone());
            if let Some(limit) = self.retention {
                while inner.events.len() > limit {
                    inner.events.pop_front();
                }
            }
            event
        };

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.send(event.clone()).await {
                tracing::error!(sequence = event.sequence, error = %e, "Audit sink closed");
            }
        }

        event
    }

    /// Events still held in memory, oldest first
    pub async fn events(&self) -> Vec<LedgerEvent> {
        self.inner.read().await.events.iter().cloned().collect()
    }

    /// Number of events ever recorded
    pub async fn len(&self) -> usize {
        self.inner.read().await.recorded as usize
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
