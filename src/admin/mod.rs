//! Admin gateway
//!
//! Authorization and pause checks consumed by every mutating operation.

mod authority;

pub use authority::{AuthorityContext, AuthorityProvider, StaticAuthority};

use crate::error::{LedgerError, LedgerResult};
use crate::telemetry::{set_gauge, GaugeMetric};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Authorization and pause gate owned by a ledger instance
pub struct AdminGateway {
    provider: Arc<dyn AuthorityProvider>,
    paused: AtomicBool,
}

impl AdminGateway {
    pub fn new(provider: Arc<dyn AuthorityProvider>) -> Self {
        Self {
            provider,
            paused: AtomicBool::new(false),
        }
    }

    /// Fails with `Unauthorized` unless the caller holds the authority role
    pub async fn require_authority(&self, ctx: &AuthorityContext) -> LedgerResult<()> {
        if self.provider.is_authority(ctx.principal()).await {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(ctx.principal().clone()))
        }
    }

    /// Fails with `Paused` while the ledger is paused
    pub fn ensure_live(&self) -> LedgerResult<()> {
        if self.is_paused() {
            Err(LedgerError::Paused)
        } else {
            Ok(())
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Pause trading. Returns whether the flag changed; a redundant call is
    /// accepted and changes nothing.
    pub async fn pause(&self, ctx: &AuthorityContext) -> LedgerResult<bool> {
        self.require_authority(ctx).await?;
        Ok(self.set_paused(true))
    }

    /// Resume trading. Returns whether the flag changed.
    pub async fn unpause(&self, ctx: &AuthorityContext) -> LedgerResult<bool> {
        self.require_authority(ctx).await?;
        Ok(self.set_paused(false))
    }

    fn set_paused(&self, paused: bool) -> bool {
        let previous = self.paused.swap(paused, Ordering::SeqCst);
        set_gauge(GaugeMetric::Paused, if paused { 1.0 } else { 0.0 });
        previous != paused
    }
}
