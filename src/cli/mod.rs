//! CLI interface for binary-ledger
//!
//! Provides subcommands for:
//! - `simulate`: Run a market lifecycle against in-memory custody
//! - `replay`: Rebuild ledger totals from an audit log
//! - `config`: Show the effective configuration

mod replay;
mod simulate;

pub use replay::ReplayArgs;
pub use simulate::SimulateArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "binary-ledger")]
#[command(about = "Binary-outcome prediction market ledger")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a market lifecycle against in-memory custody
    Simulate(SimulateArgs),
    /// Replay an audit log and print per-market totals
    Replay(ReplayArgs),
    /// Show configuration
    Config,
}
