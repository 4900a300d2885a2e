//! Replay command implementation

use crate::audit::{read_events, ReplayState};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines audit log to replay
    #[arg(long)]
    pub log: PathBuf,

    /// Output format: json or table
    #[arg(long, default_value = "table")]
    pub format: String,
}

impl ReplayArgs {
    pub async fn execute(&self) -> anyhow::Result<()> {
        tracing::info!("Replaying audit log {:?}", self.log);
        let events = read_events(&self.log)?;
        let state = ReplayState::from_events(&events);

        match self.format.as_str() {
            "json" => {
                let markets: Vec<_> = state
                    .markets()
                    .map(|(id, m)| {
                        serde_json::json!({
                            "market": id,
                            "question": m.question,
                            "status": m.status,
                            "outcome": m.outcome,
                            "total_yes": m.total_yes,
                            "total_no": m.total_no,
                            "vault": m.vault,
                        })
                    })
                    .collect();
                let violations: Vec<_> = state
                    .violations()
                    .iter()
                    .map(|v| serde_json::json!({ "sequence": v.sequence, "message": v.message }))
                    .collect();
                let report = serde_json::json!({
                    "events": state.events_applied(),
                    "treasury": state.treasury().to_string(),
                    "markets": markets,
                    "violations": violations,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            "table" => {
                print!("{}", state.format_table());
                for violation in state.violations() {
                    println!("  #{}: {}", violation.sequence, violation.message);
                }
            }
            other => anyhow::bail!("Unknown output format: {}", other),
        }

        if !state.violations().is_empty() {
            anyhow::bail!(
                "{} event(s) in {} violate ledger invariants",
                state.violations().len(),
                self.log.display()
            );
        }
        Ok(())
    }
}
