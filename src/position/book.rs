//! Balance book for a single market

use super::PositionError;
use crate::types::{AccountId, Side};
use std::collections::HashMap;

/// Balances for one side of one market
#[derive(Debug, Clone, Default)]
struct SideLedger {
    balances: HashMap<AccountId, u64>,
    total: u64,
}

/// A validated balance change
///
/// Produced by [`PositionBook::prepare_credit`] or
/// [`PositionBook::prepare_debit`] and applied with [`PositionBook::apply`]
/// once the collateral leg has settled. The caller must hold the market lock
/// between the two calls.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct BalanceUpdate {
    side: Side,
    account: AccountId,
    balance: u64,
    total: u64,
}

impl BalanceUpdate {
    /// Balance the account will hold once applied
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Side total once applied
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// YES and NO balance namespaces for a market
#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    sides: [SideLedger; 2],
}

fn index(side: Side) -> usize {
    match side {
        Side::Yes => 0,
        Side::No => 1,
    }
}

impl PositionBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance for an account on one side (zero if never held)
    pub fn balance(&self, side: Side, account: &AccountId) -> u64 {
        self.sides[index(side)]
            .balances
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all balances on one side
    pub fn side_total(&self, side: Side) -> u64 {
        self.sides[index(side)].total
    }

    /// Sum of balances on one side recomputed from the individual rows
    pub fn recomputed_total(&self, side: Side) -> u128 {
        self.sides[index(side)]
            .balances
            .values()
            .map(|b| u128::from(*b))
            .sum()
    }

    /// Number of position rows on one side, zeroed rows included
    pub fn holder_count(&self, side: Side) -> usize {
        self.sides[index(side)].balances.len()
    }

    /// Validate a credit of `amount` to the account
    pub fn prepare_credit(
        &self,
        side: Side,
        account: &AccountId,
        amount: u64,
    ) -> Result<BalanceUpdate, PositionError> {
        let ledger = &self.sides[index(side)];
        let balance = self
            .balance(side, account)
            .checked_add(amount)
            .ok_or(PositionError::Overflow)?;
        let total = ledger
            .total
            .checked_add(amount)
            .ok_or(PositionError::Overflow)?;

        Ok(BalanceUpdate {
            side,
            account: account.clone(),
            balance,
            total,
        })
    }

    /// Validate a debit of `amount` from the account
    pub fn prepare_debit(
        &self,
        side: Side,
        account: &AccountId,
        amount: u64,
    ) -> Result<BalanceUpdate, PositionError> {
        let available = self.balance(side, account);
        let balance = available
            .checked_sub(amount)
            .ok_or(PositionError::Insufficient {
                requested: amount,
                available,
            })?;
        // total >= any single balance, so this only fails on a corrupted book
        let total = self.sides[index(side)]
            .total
            .checked_sub(amount)
            .ok_or(PositionError::Overflow)?;

        Ok(BalanceUpdate {
            side,
            account: account.clone(),
            balance,
            total,
        })
    }

    /// Apply a previously validated update
    pub fn apply(&mut self, update: BalanceUpdate) {
        let ledger = &mut self.sides[index(update.side)];
        ledger.balances.insert(update.account, update.balance);
        ledger.total = update.total;
    }
}
