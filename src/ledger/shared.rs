//! Shared ledger state

use crate::admin::{AdminGateway, AuthorityProvider};
use crate::audit::AuditLog;
use crate::clock::Clock;
use crate::custody::Custody;
use crate::market::MarketStore;
use crate::trade::FeeSchedule;
use crate::treasury::FeeTreasury;
use std::sync::Arc;
use std::time::Duration;

/// Runtime settings of a ledger instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSettings {
    pub fees: FeeSchedule,
    /// Upper bound on every custody call
    pub custody_timeout: Duration,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            custody_timeout: Duration::from_millis(2_000),
        }
    }
}

/// Components shared by the trade and settlement processors
pub struct LedgerCore {
    pub(crate) store: MarketStore,
    pub(crate) treasury: FeeTreasury,
    pub(crate) gateway: AdminGateway,
    pub(crate) custody: Arc<dyn Custody>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) audit: AuditLog,
    pub(crate) settings: LedgerSettings,
}

impl LedgerCore {
    pub fn new(
        settings: LedgerSettings,
        authority: Arc<dyn AuthorityProvider>,
        custody: Arc<dyn Custody>,
        clock: Arc<dyn Clock>,
        audit: AuditLog,
    ) -> Self {
        Self {
            store: MarketStore::new(),
            treasury: FeeTreasury::new(),
            gateway: AdminGateway::new(authority),
            custody,
            clock,
            audit,
            settings,
        }
    }
}
