//! Trade processor
//!
//! Acquire and release of side positions while a market is open. Each call
//! holds the market lock from validation through the custody transfer to
//! the final state update.

mod fees;

pub use fees::FeeSchedule;

use crate::admin::AuthorityContext;
use crate::audit::EventKind;
use crate::custody::settle;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::LedgerCore;
use crate::telemetry::{increment, CounterMetric};
use crate::types::{MarketId, Side};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of an acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acquired {
    /// Position units added (amount minus fee)
    pub credited: u64,
    /// Collateral skimmed into the treasury
    pub fee: u64,
}

/// Result of a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Released {
    /// Collateral returned to the caller
    pub payout: u64,
    /// Collateral skimmed into the treasury
    pub fee: u64,
}

/// Executes acquire and release against the shared ledger state
pub struct TradeProcessor {
    core: Arc<LedgerCore>,
}

impl TradeProcessor {
    pub fn new(core: Arc<LedgerCore>) -> Self {
        Self { core }
    }

    /// Buy `amount` of collateral into `side` of a market
    pub async fn acquire(
        &self,
        ctx: &AuthorityContext,
        market_id: MarketId,
        side: Side,
        amount: u64,
    ) -> LedgerResult<Acquired> {
        let core = &self.core;
        core.gateway.ensure_live()?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let slot = core.store.slot(market_id).await?;
        let mut market = slot.lock().await;
        // Pause may have landed while waiting for the lock
        core.gateway.ensure_live()?;
        market.ensure_open()?;
        let now = core.clock.now();
        if !market.accepts_trades(now) {
            return Err(LedgerError::BettingClosed(market_id));
        }

        let account = ctx.principal();
        let fee = core.settings.fees.acquire_fee(amount)?;
        let credited = amount - fee;
        let update = market.book.prepare_credit(side, account, credited)?;
        let vault = market
            .vault
            .checked_add(credited)
            .ok_or(LedgerError::Overflow)?;

        settle(
            core.settings.custody_timeout,
            core.custody.debit(account, amount),
        )
        .await?;

        market.book.apply(update);
        market.vault = vault;
        // Logged ahead of the accrue so a concurrent sweep never precedes it
        core.audit
            .record(
                now,
                EventKind::Acquired {
                    market: market_id,
                    account: account.clone(),
                    side,
                    amount,
                    credited,
                    fee,
                },
            )
            .await;
        core.treasury.accrue(fee).await;
        increment(CounterMetric::Acquires, 1);

        tracing::info!(
            market = %market_id,
            account = %account,
            %side,
            amount,
            credited,
            fee,
            "Position acquired"
        );

        Ok(Acquired { credited, fee })
    }

    /// Sell `amount` of a held position back for collateral
    pub async fn release(
        &self,
        ctx: &AuthorityContext,
        market_id: MarketId,
        side: Side,
        amount: u64,
    ) -> LedgerResult<Released> {
        let core = &self.core;
        core.gateway.ensure_live()?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let slot = core.store.slot(market_id).await?;
        let mut market = slot.lock().await;
        core.gateway.ensure_live()?;
        market.ensure_open()?;
        let now = core.clock.now();
        if !market.accepts_trades(now) {
            return Err(LedgerError::BettingClosed(market_id));
        }

        let account = ctx.principal();
        let update = market.book.prepare_debit(side, account, amount)?;
        let vault = market
            .vault
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;
        let fee = core.settings.fees.release_fee(amount)?;
        let payout = amount - fee;

        settle(
            core.settings.custody_timeout,
            core.custody.credit(account, payout),
        )
        .await?;

        market.book.apply(update);
        market.vault = vault;
        core.audit
            .record(
                now,
                EventKind::Released {
                    market: market_id,
                    account: account.clone(),
                    side,
                    amount,
                    payout,
                    fee,
                },
            )
            .await;
        core.treasury.accrue(fee).await;
        increment(CounterMetric::Releases, 1);

        tracing::info!(
            market = %market_id,
            account = %account,
            %side,
            amount,
            payout,
            fee,
            "Position released"
        );

        Ok(Released { payout, fee })
    }
}
