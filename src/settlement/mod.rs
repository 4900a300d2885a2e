//! Resolution and claims processor
//!
//! Finalizes markets (resolve or cancel) and pays holders out of the market
//! vault afterwards.

use crate::admin::AuthorityContext;
use crate::audit::EventKind;
use crate::custody::settle;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::LedgerCore;
use crate::market::{Market, MarketStatus};
use crate::telemetry::{adjust_gauge, increment, CounterMetric, GaugeMetric};
use crate::types::{MarketId, Side};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What a claim paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClaimKind {
    /// Winning balance redeemed 1:1
    Winnings { side: Side },
    /// Net balances returned after cancellation
    Refund { yes: u64, no: u64 },
}

/// Result of a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claimed {
    pub payout: u64,
    pub kind: ClaimKind,
}

/// Resolves, cancels and pays out markets
pub struct SettlementProcessor {
    core: Arc<LedgerCore>,
}

impl SettlementProcessor {
    pub fn new(core: Arc<LedgerCore>) -> Self {
        Self { core }
    }

    /// Declare the outcome of a market whose trading window has ended
    pub async fn resolve(
        &self,
        ctx: &AuthorityContext,
        market_id: MarketId,
        outcome: bool,
    ) -> LedgerResult<()> {
        let core = &self.core;
        core.gateway.require_authority(ctx).await?;

        let slot = core.store.slot(market_id).await?;
        let mut market = slot.lock().await;
        match market.status {
            MarketStatus::Open => {}
            MarketStatus::Resolved { .. } => return Err(LedgerError::AlreadyResolved(market_id)),
            MarketStatus::Cancelled { .. } => return Err(LedgerError::MarketNotOpen(market_id)),
        }
        let now = core.clock.now();
        if market.accepts_trades(now) {
            return Err(LedgerError::BettingNotEnded(market_id));
        }

        let side = Side::from_outcome(outcome);
        market.status = MarketStatus::Resolved {
            outcome: side,
            resolved_at: now,
        };
        core.audit
            .record(
                now,
                EventKind::Resolved {
                    market: market_id,
                    outcome: side,
                },
            )
            .await;
        adjust_gauge(GaugeMetric::OpenMarkets, -1.0);

        tracing::info!(
            market = %market_id,
            outcome = %side,
            winning_total = market.total(side),
            vault = market.vault,
            "Market resolved"
        );
        Ok(())
    }

    /// Withdraw an open market; holders reclaim their balances through `claim`
    pub async fn cancel(&self, ctx: &AuthorityContext, market_id: MarketId) -> LedgerResult<()> {
        let core = &self.core;
        core.gateway.require_authority(ctx).await?;

        let slot = core.store.slot(market_id).await?;
        let mut market = slot.lock().await;
        match market.status {
            MarketStatus::Open => {}
            MarketStatus::Resolved { .. } => return Err(LedgerError::AlreadyResolved(market_id)),
            MarketStatus::Cancelled { .. } => return Err(LedgerError::MarketNotOpen(market_id)),
        }

        let now = core.clock.now();
        market.status = MarketStatus::Cancelled { cancelled_at: now };
        core.audit
            .record(now, EventKind::Cancelled { market: market_id })
            .await;
        adjust_gauge(GaugeMetric::OpenMarkets, -1.0);

        tracing::info!(market = %market_id, vault = market.vault, "Market cancelled");
        Ok(())
    }

    /// Pay the caller what the finalized market owes them
    pub async fn claim(&self, ctx: &AuthorityContext, market_id: MarketId) -> LedgerResult<Claimed> {
        let slot = self.core.store.slot(market_id).await?;
        let mut market = slot.lock().await;
        match market.status {
            MarketStatus::Open => Err(LedgerError::MarketNotResolved(market_id)),
            MarketStatus::Resolved { outcome, .. } => {
                self.pay_winnings(ctx, &mut market, outcome).await
            }
            MarketStatus::Cancelled { .. } => self.refund(ctx, &mut market).await,
        }
    }

    async fn pay_winnings(
        &self,
        ctx: &AuthorityContext,
        market: &mut Market,
        outcome: Side,
    ) -> LedgerResult<Claimed> {
        let core = &self.core;
        let account = ctx.principal();
        let payout = market.book.balance(outcome, account);
        if payout == 0 {
            return Err(LedgerError::NoWinningShares);
        }
        let update = market.book.prepare_debit(outcome, account, payout)?;
        let vault = market
            .vault
            .checked_sub(payout)
            .ok_or(LedgerError::Overflow)?;

        settle(core.settings.custody_timeout, core.custody.credit(account, payout)).await?;

        market.book.apply(update);
        market.vault = vault;
        let now = core.clock.now();
        core.audit
            .record(
                now,
                EventKind::Claimed {
                    market: market.id(),
                    account: account.clone(),
                    side: outcome,
                    payout,
                },
            )
            .await;
        increment(CounterMetric::Claims, 1);
        increment(CounterMetric::CollateralPaidOut, payout);

        tracing::info!(market = %market.id(), account = %account, payout, "Winnings claimed");
        Ok(Claimed {
            payout,
            kind: ClaimKind::Winnings { side: outcome },
        })
    }

    async fn refund(
        &self,
        ctx: &AuthorityContext,
        market: &mut Market,
    ) -> LedgerResult<Claimed> {
        let core = &self.core;
        let account = ctx.principal();
        let yes = market.book.balance(Side::Yes, account);
        let no = market.book.balance(Side::No, account);
        let payout = yes.checked_add(no).ok_or(LedgerError::Overflow)?;
        if payout == 0 {
            return Err(LedgerError::NothingToRefund);
        }

        let mut updates = Vec::with_capacity(2);
        for (side, amount) in [(Side::Yes, yes), (Side::No, no)] {
            if amount > 0 {
                updates.push(market.book.prepare_debit(side, account, amount)?);
            }
        }
        let vault = market
            .vault
            .checked_sub(payout)
            .ok_or(LedgerError::Overflow)?;

        settle(core.settings.custody_timeout, core.custody.credit(account, payout)).await?;

        for update in updates {
            market.book.apply(update);
        }
        market.vault = vault;
        let now = core.clock.now();
        core.audit
            .record(
                now,
                EventKind::Refunded {
                    market: market.id(),
                    account: account.clone(),
                    yes,
                    no,
                },
            )
            .await;
        increment(CounterMetric::Refunds, 1);
        increment(CounterMetric::CollateralPaidOut, payout);

        tracing::info!(market = %market.id(), account = %account, yes, no, "Position refunded");
        Ok(Claimed {
            payout,
            kind: ClaimKind::Refund { yes, no },
        })
    }
}
