//! Shared harness

use binary_ledger::clock::ManualClock;
use binary_ledger::{
    AccountId, AuthorityContext, InMemoryCustody, LedgerSettings, MarketId, MarketLedger,
    StaticAuthority,
};
use chrono::{DateTime, Duration};
use std::sync::Arc;

pub const ADMIN: &str = "admin";
pub const WEEK: u64 = 604_800;
pub const FUNDING: u64 = 1_000_000000;

pub struct Harness {
    pub ledger: MarketLedger,
    pub custody: Arc<InMemoryCustody>,
    pub clock: Arc<ManualClock>,
    pub admin: AuthorityContext,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_custody(InMemoryCustody::new(), LedgerSettings::default()).await
    }

    pub async fn with_custody(custody: InMemoryCustody, settings: LedgerSettings) -> Self {
        let custody = Arc::new(custody);
        for who in ["alice", "bob", "carol"] {
            custody.fund(&AccountId::from(who), FUNDING).await;
        }
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let ledger = MarketLedger::new(
            settings,
            Arc::new(StaticAuthority::new([ADMIN])),
            custody.clone(),
            clock.clone(),
        );
        Self {
            ledger,
            custody,
            clock,
            admin: AuthorityContext::new(ADMIN),
        }
    }

    pub async fn open_market(&self) -> MarketId {
        self.ledger
            .create_market(&self.admin, "Will it rain next week?", WEEK, 1)
            .await
            .unwrap()
    }

    pub fn end_trading(&self) {
        self.clock.advance(Duration::seconds(WEEK as i64));
    }

    pub async fn external(&self, who: &str) -> u64 {
        self.custody.balance(&AccountId::from(who)).await
    }
}

pub fn user(name: &str) -> AuthorityContext {
    AuthorityContext::new(name)
}
