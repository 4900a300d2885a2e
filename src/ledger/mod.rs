//! Ledger service facade
//!
//! [`MarketLedger`] is the single entry point for callers. It wires the
//! market store, fee treasury, admin gateway and the two processors around
//! one shared [`LedgerCore`], and counts every rejected call by reason.

mod shared;

pub use shared::{LedgerCore, LedgerSettings};

use crate::admin::{AuthorityContext, AuthorityProvider};
use crate::audit::{AuditLog, EventKind, LedgerEvent};
use crate::clock::Clock;
use crate::custody::Custody;
use crate::error::LedgerResult;
use crate::market::{InvariantViolation, MarketSnapshot};
use crate::settlement::{Claimed, SettlementProcessor};
use crate::telemetry::{adjust_gauge, increment, record_rejection, CounterMetric, GaugeMetric};
use crate::trade::{Acquired, Released, TradeProcessor};
use crate::treasury::TreasuryStats;
use crate::types::{AccountId, MarketId, Side};
use std::sync::Arc;

/// Binary-outcome market ledger
pub struct MarketLedger {
    core: Arc<LedgerCore>,
    trades: TradeProcessor,
    settlement: SettlementProcessor,
}

impl MarketLedger {
    /// Create a ledger with an in-memory audit log
    pub fn new(
        settings: LedgerSettings,
        authority: Arc<dyn AuthorityProvider>,
        custody: Arc<dyn Custody>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_audit(settings, authority, custody, clock, AuditLog::new())
    }

    /// Create a ledger writing to the given audit log
    pub fn with_audit(
        settings: LedgerSettings,
        authority: Arc<dyn AuthorityProvider>,
        custody: Arc<dyn Custody>,
        clock: Arc<dyn Clock>,
        audit: AuditLog,
    ) -> Self {
        let core = Arc::new(LedgerCore::new(settings, authority, custody, clock, audit));
        Self {
            trades: TradeProcessor::new(core.clone()),
            settlement: SettlementProcessor::new(core.clone()),
            core,
        }
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.core.settings
    }

    // ── Market lifecycle ────────────────────────────────────────────────

    /// Open a new market ending `duration_seconds` from now
    pub async fn create_market(
        &self,
        ctx: &AuthorityContext,
        question: &str,
        duration_seconds: u64,
        category: u32,
    ) -> LedgerResult<MarketId> {
        self.create_market_inner(ctx, question, duration_seconds, category)
            .await
            .inspect_err(|e| record_rejection("create_market", e.reason()))
    }

    async fn create_market_inner(
        &self,
        ctx: &AuthorityContext,
        question: &str,
        duration_seconds: u64,
        category: u32,
    ) -> LedgerResult<MarketId> {
        let core = &self.core;
        core.gateway.require_authority(ctx).await?;
        core.gateway.ensure_live()?;

        let now = core.clock.now();
        let (id, market) = core
            .store
            .create_locked(question, duration_seconds, category, now)
            .await?;
        core.audit
            .record(
                now,
                EventKind::MarketCreated {
                    market: id,
                    question: market.question().to_string(),
                    category: market.category(),
                    end_time: market.end_time(),
                },
            )
            .await;
        increment(CounterMetric::MarketsCreated, 1);
        adjust_gauge(GaugeMetric::OpenMarkets, 1.0);

        tracing::info!(
            market = %id,
            question = market.question(),
            category,
            end_time = %market.end_time(),
            "Market created"
        );
        Ok(id)
    }

    /// Declare the outcome once the trading window has closed
    pub async fn resolve(
        &self,
        ctx: &AuthorityContext,
        market: MarketId,
        outcome: bool,
    ) -> LedgerResult<()> {
        self.settlement
            .resolve(ctx, market, outcome)
            .await
            .inspect_err(|e| record_rejection("resolve", e.reason()))
    }

    /// Withdraw an open market so holders can reclaim their balances
    pub async fn cancel(&self, ctx: &AuthorityContext, market: MarketId) -> LedgerResult<()> {
        self.settlement
            .cancel(ctx, market)
            .await
            .inspect_err(|e| record_rejection("cancel", e.reason()))
    }

    // ── Trading ─────────────────────────────────────────────────────────

    pub async fn acquire(
        &self,
        ctx: &AuthorityContext,
        market: MarketId,
        side: Side,
        amount: u64,
    ) -> LedgerResult<Acquired> {
        self.trades
            .acquire(ctx, market, side, amount)
            .await
            .inspect_err(|e| record_rejection("acquire", e.reason()))
    }

    pub async fn release(
        &self,
        ctx: &AuthorityContext,
        market: MarketId,
        side: Side,
        amount: u64,
    ) -> LedgerResult<Released> {
        self.trades
            .release(ctx, market, side, amount)
            .await
            .inspect_err(|e| record_rejection("release", e.reason()))
    }

    pub async fn claim(&self, ctx: &AuthorityContext, market: MarketId) -> LedgerResult<Claimed> {
        self.settlement
            .claim(ctx, market)
            .await
            .inspect_err(|e| record_rejection("claim", e.reason()))
    }

    // ── Administration ──────────────────────────────────────────────────

    /// Sweep the treasury to the calling authority
    pub async fn withdraw_fees(&self, ctx: &AuthorityContext) -> LedgerResult<u64> {
        self.withdraw_fees_inner(ctx)
            .await
            .inspect_err(|e| record_rejection("withdraw_fees", e.reason()))
    }

    async fn withdraw_fees_inner(&self, ctx: &AuthorityContext) -> LedgerResult<u64> {
        let core = &self.core;
        core.gateway.require_authority(ctx).await?;

        let to = ctx.principal();
        let amount = core
            .treasury
            .withdraw(to, core.custody.as_ref(), core.settings.custody_timeout)
            .await?;
        if amount > 0 {
            core.audit
                .record(
                    core.clock.now(),
                    EventKind::FeesWithdrawn {
                        to: to.clone(),
                        amount,
                    },
                )
                .await;
            tracing::info!(to = %to, amount, "Fees withdrawn");
        }
        Ok(amount)
    }

    /// Stop new markets and trading. Returns whether the flag changed.
    pub async fn pause(&self, ctx: &AuthorityContext) -> LedgerResult<bool> {
        let changed = self
            .core
            .gateway
            .pause(ctx)
            .await
            .inspect_err(|e| record_rejection("pause", e.reason()))?;
        if changed {
            self.core
                .audit
                .record(
                    self.core.clock.now(),
                    EventKind::Paused {
                        by: ctx.principal().clone(),
                    },
                )
                .await;
            tracing::warn!(by = %ctx.principal(), "Ledger paused");
        }
        Ok(changed)
    }

    /// Resume trading. Returns whether the flag changed.
    pub async fn unpause(&self, ctx: &AuthorityContext) -> LedgerResult<bool> {
        let changed = self
            .core
            .gateway
            .unpause(ctx)
            .await
            .inspect_err(|e| record_rejection("unpause", e.reason()))?;
        if changed {
            self.core
                .audit
                .record(
                    self.core.clock.now(),
                    EventKind::Unpaused {
                        by: ctx.principal().clone(),
                    },
                )
                .await;
            tracing::info!(by = %ctx.principal(), "Ledger unpaused");
        }
        Ok(changed)
    }

    pub fn is_paused(&self) -> bool {
        self.core.gateway.is_paused()
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub async fn get_market(&self, market: MarketId) -> LedgerResult<MarketSnapshot> {
        self.core.store.snapshot(market).await
    }

    pub async fn list_markets(&self) -> Vec<MarketSnapshot> {
        self.core.store.list().await
    }

    /// Balance held by `account` on one side of a market
    pub async fn position(
        &self,
        market: MarketId,
        side: Side,
        account: &AccountId,
    ) -> LedgerResult<u64> {
        let slot = self.core.store.slot(market).await?;
        let market = slot.lock().await;
        Ok(market.book().balance(side, account))
    }

    /// Unswept fee balance
    pub async fn fee_balance(&self) -> u128 {
        self.core.treasury.balance().await
    }

    pub async fn treasury_stats(&self) -> TreasuryStats {
        self.core.treasury.stats().await
    }

    /// Verify totals and solvency of one market.
    ///
    /// The outer error means the market does not exist; the inner one is the
    /// first violated invariant.
    pub async fn check_invariants(
        &self,
        market: MarketId,
    ) -> LedgerResult<Result<(), InvariantViolation>> {
        let slot = self.core.store.slot(market).await?;
        let market = slot.lock().await;
        Ok(market.check_invariants())
    }

    /// Audit events still held in memory
    pub async fn audit_events(&self) -> Vec<LedgerEvent> {
        self.core.audit.events().await
    }
}
