//! binary-ledger: ledger for binary-outcome prediction markets
//!
//! This library provides the core components for:
//! - Market creation with a fixed trading window
//! - Acquiring and releasing YES/NO positions against pooled collateral
//! - Resolution, cancellation and 1:1 redemption of winning positions
//! - Fee collection into a single treasury
//! - Authority checks and an emergency pause
//! - Audit recording and replay
//! - Full observability stack

pub mod admin;
pub mod audit;
pub mod cli;
pub mod clock;
pub mod config;
pub mod custody;
pub mod error;
pub mod ledger;
pub mod market;
pub mod position;
pub mod settlement;
pub mod telemetry;
pub mod trade;
pub mod treasury;
pub mod types;

pub use admin::{AuthorityContext, AuthorityProvider, StaticAuthority};
pub use custody::{Custody, CustodyError, InMemoryCustody};
pub use error::{LedgerError, LedgerResult};
pub use ledger::{LedgerSettings, MarketLedger};
pub use types::{AccountId, MarketId, Side};
