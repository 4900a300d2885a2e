//! Rebuild ledger totals from an audit log

use super::{EventKind, LedgerEvent};
use crate::market::StatusKind;
use crate::types::{AccountId, MarketId, Side};
use anyhow::Context;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::Path;

/// Load a JSON-lines audit log, skipping blank lines
pub fn read_events(path: impl AsRef<Path>) -> anyhow::Result<Vec<LedgerEvent>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read audit log {}", path.display()))?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid audit event on line {}", n + 1))
        })
        .collect()
}

/// Market state reconstructed from events
#[derive(Debug, Clone)]
pub struct ReplayMarket {
    pub question: String,
    pub status: StatusKind,
    pub outcome: Option<Side>,
    pub total_yes: u64,
    pub total_no: u64,
    pub vault: u64,
    positions: HashMap<(Side, AccountId), u64>,
}

impl ReplayMarket {
    fn new(question: String) -> Self {
        Self {
            question,
            status: StatusKind::Open,
            outcome: None,
            total_yes: 0,
            total_no: 0,
            vault: 0,
            positions: HashMap::new(),
        }
    }

    pub fn position(&self, side: Side, account: &AccountId) -> u64 {
        self.positions
            .get(&(side, account.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn total(&self, side: Side) -> u64 {
        match side {
            Side::Yes => self.total_yes,
            Side::No => self.total_no,
        }
    }

    fn set_total(&mut self, side: Side, total: u64) {
        match side {
            Side::Yes => self.total_yes = total,
            Side::No => self.total_no = total,
        }
    }

    fn credit(&mut self, side: Side, account: &AccountId, amount: u64) -> Result<(), String> {
        let held = self.position(side, account);
        let balance = held
            .checked_add(amount)
            .ok_or_else(|| format!("{} {} balance overflows", account, side))?;
        let total = self
            .total(side)
            .checked_add(amount)
            .ok_or_else(|| format!("{} total overflows", side))?;
        let vault = self
            .vault
            .checked_add(amount)
            .ok_or_else(|| "vault overflows".to_string())?;

        self.positions.insert((side, account.clone()), balance);
        self.set_total(side, total);
        self.vault = vault;
        Ok(())
    }

    /// Remove `amount` from a position; `paid` is what leaves the vault
    fn debit(&mut self, side: Side, account: &AccountId, amount: u64, paid: u64) -> Result<(), String> {
        let held = self.position(side, account);
        let balance = held
            .checked_sub(amount)
            .ok_or_else(|| format!("{} {} balance {} below {}", account, side, held, amount))?;
        let total = self
            .total(side)
            .checked_sub(amount)
            .ok_or_else(|| format!("{} total below {}", side, amount))?;
        let vault = self
            .vault
            .checked_sub(paid)
            .ok_or_else(|| format!("vault {} below payout {}", self.vault, paid))?;

        self.positions.insert((side, account.clone()), balance);
        self.set_total(side, total);
        self.vault = vault;
        Ok(())
    }

    fn obligations(&self) -> u128 {
        match (self.status, self.outcome) {
            (StatusKind::Resolved, Some(Side::Yes)) => u128::from(self.total_yes),
            (StatusKind::Resolved, Some(Side::No)) => u128::from(self.total_no),
            _ => u128::from(self.total_yes) + u128::from(self.total_no),
        }
    }
}

/// An event the replay could not apply cleanly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayViolation {
    pub sequence: u64,
    pub message: String,
}

/// Folds audit events into per-market totals and a treasury balance
#[derive(Debug, Default)]
pub struct ReplayState {
    markets: BTreeMap<MarketId, ReplayMarket>,
    treasury: u128,
    events_applied: usize,
    violations: Vec<ReplayViolation>,
}

impl ReplayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay a whole log
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a LedgerEvent>) -> Self {
        let mut state = Self::new();
        for event in events {
            state.apply(event);
        }
        state
    }

    /// Apply one event, recording a violation instead of failing
    pub fn apply(&mut self, event: &LedgerEvent) {
        self.events_applied += 1;
        if let Err(message) = self.try_apply(&event.kind) {
            tracing::warn!(sequence = event.sequence, %message, "Replay violation");
            self.violations.push(ReplayViolation {
                sequence: event.sequence,
                message,
            });
        }
    }

    fn try_apply(&mut self, kind: &EventKind) -> Result<(), String> {
        match kind {
            EventKind::MarketCreated {
                market, question, ..
            } => {
                if self.markets.contains_key(market) {
                    return Err(format!("market {} created twice", market));
                }
                self.markets
                    .insert(*market, ReplayMarket::new(question.clone()));
                Ok(())
            }
            EventKind::Acquired {
                market,
                account,
                side,
                amount,
                credited,
                fee,
            } => {
                if credited.checked_add(*fee) != Some(*amount) {
                    return Err(format!(
                        "acquire of {} split into {} + {}",
                        amount, credited, fee
                    ));
                }
                self.market_mut(*market)?.credit(*side, account, *credited)?;
                self.treasury += u128::from(*fee);
                self.check_solvency(*market)
            }
            EventKind::Released {
                market,
                account,
                side,
                amount,
                payout,
                fee,
            } => {
                if payout.checked_add(*fee) != Some(*amount) {
                    return Err(format!(
                        "release of {} split into {} + {}",
                        amount, payout, fee
                    ));
                }
                self.market_mut(*market)?
                    .debit(*side, account, *amount, *amount)?;
                self.treasury += u128::from(*fee);
                self.check_solvency(*market)
            }
            EventKind::Resolved { market, outcome } => {
                let m = self.market_mut(*market)?;
                if m.status != StatusKind::Open {
                    return Err(format!("market {} resolved while {:?}", market, m.status));
                }
                m.status = StatusKind::Resolved;
                m.outcome = Some(*outcome);
                Ok(())
            }
            EventKind::Cancelled { market } => {
                let m = self.market_mut(*market)?;
                if m.status != StatusKind::Open {
                    return Err(format!("market {} cancelled while {:?}", market, m.status));
                }
                m.status = StatusKind::Cancelled;
                Ok(())
            }
            EventKind::Claimed {
                market,
                account,
                side,
                payout,
            } => {
                self.market_mut(*market)?
                    .debit(*side, account, *payout, *payout)?;
                self.check_solvency(*market)
            }
            EventKind::Refunded {
                market,
                account,
                yes,
                no,
            } => {
                let mut refunded = self.market_mut(*market)?.clone();
                refunded.debit(Side::Yes, account, *yes, *yes)?;
                refunded.debit(Side::No, account, *no, *no)?;
                *self.market_mut(*market)? = refunded;
                self.check_solvency(*market)
            }
            EventKind::FeesWithdrawn { amount, .. } => {
                self.treasury = self
                    .treasury
                    .checked_sub(u128::from(*amount))
                    .ok_or_else(|| format!("withdrew {} from treasury {}", amount, self.treasury))?;
                Ok(())
            }
            EventKind::Paused { .. } | EventKind::Unpaused { .. } => Ok(()),
        }
    }

    fn market_mut(&mut self, id: MarketId) -> Result<&mut ReplayMarket, String> {
        self.markets
            .get_mut(&id)
            .ok_or_else(|| format!("unknown market {}", id))
    }

    fn check_solvency(&self, id: MarketId) -> Result<(), String> {
        match self.markets.get(&id) {
            Some(m) if u128::from(m.vault) < m.obligations() => Err(format!(
                "market {} vault {} below obligations {}",
                id,
                m.vault,
                m.obligations()
            )),
            _ => Ok(()),
        }
    }

    pub fn market(&self, id: MarketId) -> Option<&ReplayMarket> {
        self.markets.get(&id)
    }

    pub fn markets(&self) -> impl Iterator<Item = (&MarketId, &ReplayMarket)> {
        self.markets.iter()
    }

    /// Unswept treasury balance after replay
    pub fn treasury(&self) -> u128 {
        self.treasury
    }

    pub fn events_applied(&self) -> usize {
        self.events_applied
    }

    pub fn violations(&self) -> &[ReplayViolation] {
        &self.violations
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "══════════════════════════════════════════════════════════════════════");
        let _ = writeln!(out, "                          LEDGER REPLAY");
        let _ = writeln!(out, "══════════════════════════════════════════════════════════════════════");
        let _ = writeln!(
            out,
            "{:>6}  {:<10} {:<7} {:>14} {:>14} {:>14}",
            "MARKET", "STATUS", "OUTCOME", "TOTAL YES", "TOTAL NO", "VAULT"
        );
        let _ = writeln!(out, "──────────────────────────────────────────────────────────────────────");
        for (id, m) in &self.markets {
            let status = match m.status {
                StatusKind::Open => "open",
                StatusKind::Resolved => "resolved",
                StatusKind::Cancelled => "cancelled",
            };
            let outcome = m.outcome.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{:>6}  {:<10} {:<7} {:>14} {:>14} {:>14}",
                id.0, status, outcome, m.total_yes, m.total_no, m.vault
            );
        }
        let _ = writeln!(out, "──────────────────────────────────────────────────────────────────────");
        let _ = writeln!(out, "Events applied:   {}", self.events_applied);
        let _ = writeln!(out, "Treasury balance: {}", self.treasury);
        let _ = writeln!(out, "Violations:       {}", self.violations.len());
        let _ = writeln!(out, "══════════════════════════════════════════════════════════════════════");
        out
    }
}
