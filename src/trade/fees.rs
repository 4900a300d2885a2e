//! Fee schedule

use crate::error::{LedgerError, LedgerResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Rates skimmed into the treasury, each in `[0, 1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub acquire_rate: Decimal,
    pub release_rate: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            acquire_rate: dec!(0.02),
            release_rate: Decimal::ZERO,
        }
    }
}

impl FeeSchedule {
    pub fn new(acquire_rate: Decimal, release_rate: Decimal) -> Self {
        Self {
            acquire_rate,
            release_rate,
        }
    }

    /// Whether both rates lie in `[0, 1)`
    pub fn is_valid(&self) -> bool {
        valid_rate(self.acquire_rate) && valid_rate(self.release_rate)
    }

    /// Fee on an acquire of `amount`, rounded down
    pub fn acquire_fee(&self, amount: u64) -> LedgerResult<u64> {
        fee_for(amount, self.acquire_rate)
    }

    /// Fee on a release of `amount`, rounded down
    pub fn release_fee(&self, amount: u64) -> LedgerResult<u64> {
        fee_for(amount, self.release_rate)
    }
}

fn valid_rate(rate: Decimal) -> bool {
    rate >= Decimal::ZERO && rate < Decimal::ONE
}

fn fee_for(amount: u64, rate: Decimal) -> LedgerResult<u64> {
    let fee = Decimal::from(amount)
        .checked_mul(rate)
        .ok_or(LedgerError::Overflow)?
        .floor()
        .to_u64()
        .ok_or(LedgerError::Overflow)?;
    // A rate below one can never take the whole amount, but a bad schedule
    // must not either.
    if fee >= amount && amount > 0 {
        return Err(LedgerError::Overflow);
    }
    Ok(fee)
}
