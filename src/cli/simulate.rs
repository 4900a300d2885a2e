//! Simulate command implementation

use crate::admin::AuthorityContext;
use crate::audit::{AuditLog, AuditRecorder, RecorderConfig};
use crate::clock::{Clock, ManualClock};
use crate::config::Config;
use crate::custody::InMemoryCustody;
use crate::ledger::MarketLedger;
use crate::types::Side;
use chrono::Duration;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

const WEEK_SECS: u64 = 604_800;
const STARTING_COLLATERAL: u64 = 1_000_000000;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Write the audit trail to this JSON-lines file
    #[arg(long)]
    pub audit_out: Option<PathBuf>,

    /// Print the audit trail as JSON after the run
    #[arg(long)]
    pub print_events: bool,
}

impl SimulateArgs {
    /// Run a full market lifecycle against in-memory custody
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let authority = config
            .ledger
            .authorities
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No authority configured"))?;
        let admin = AuthorityContext::new(authority);
        let alice = AuthorityContext::new("alice");
        let bob = AuthorityContext::new("bob");

        let custody = Arc::new(InMemoryCustody::new());
        for who in [&alice, &bob] {
            custody.fund(who.principal(), STARTING_COLLATERAL).await;
        }
        let clock = Arc::new(ManualClock::default());

        let recorder = self.recorder(config).map(AuditRecorder::new);
        let audit = match &recorder {
            Some(r) => AuditLog::with_sink(r.sink()),
            None => AuditLog::new(),
        };
        let ledger = MarketLedger::with_audit(
            config.ledger_settings(),
            Arc::new(config.authority()),
            custody.clone(),
            clock.clone(),
            audit,
        );

        println!("Simulating market lifecycle (start {})", clock.now());

        let market = ledger
            .create_market(&admin, "Will it rain tomorrow?", WEEK_SECS, 1)
            .await?;
        println!("  created market {}", market);

        let acquired = ledger
            .acquire(&alice, market, Side::Yes, 100_000000)
            .await?;
        println!(
            "  alice YES 100000000 -> credited {}, fee {}",
            acquired.credited, acquired.fee
        );
        let acquired = ledger.acquire(&bob, market, Side::No, 200_000000).await?;
        println!(
            "  bob   NO  200000000 -> credited {}, fee {}",
            acquired.credited, acquired.fee
        );

        clock.advance(Duration::seconds(WEEK_SECS as i64));
        ledger.resolve(&admin, market, true).await?;
        println!("  resolved YES at {}", clock.now());

        let claimed = ledger.claim(&alice, market).await?;
        println!("  alice claimed {}", claimed.payout);
        match ledger.claim(&bob, market).await {
            Ok(claimed) => println!("  bob claimed {}", claimed.payout),
            Err(e) => println!("  bob claim rejected: {}", e),
        }

        let swept = ledger.withdraw_fees(&admin).await?;
        println!("  fees withdrawn: {}", swept);
        let swept = ledger.withdraw_fees(&admin).await?;
        println!("  second withdrawal: {}", swept);

        let snapshot = ledger.get_market(market).await?;
        println!();
        println!("Market {}: {}", snapshot.id, snapshot.question);
        println!("  status:    {:?}", snapshot.status);
        println!("  total yes: {}", snapshot.total_yes);
        println!("  total no:  {}", snapshot.total_no);
        println!("  vault:     {}", snapshot.vault);
        match ledger.check_invariants(market).await? {
            Ok(()) => println!("  invariants hold"),
            Err(violation) => println!("  invariant violated: {}", violation),
        }
        for who in [&alice, &bob, &admin] {
            println!(
                "  {} external balance: {}",
                who.principal(),
                custody.balance(who.principal()).await
            );
        }

        if self.print_events {
            println!();
            for event in ledger.audit_events().await {
                println!("{}", serde_json::to_string(&event)?);
            }
        }

        // The ledger holds the recorder's sink; it must go first
        drop(ledger);
        if let Some(recorder) = recorder {
            let path = recorder.output_path().to_path_buf();
            let stats = recorder.shutdown().await?;
            println!();
            println!("Audit: {} events written to {}", stats.events_written, path.display());
        }

        Ok(())
    }

    fn recorder(&self, config: &Config) -> Option<RecorderConfig> {
        match (&self.audit_out, config.audit.enabled) {
            (Some(path), _) => Some(RecorderConfig {
                output_path: path.clone(),
                ..config.recorder_config()
            }),
            (None, true) => Some(config.recorder_config()),
            (None, false) => None,
        }
    }
}
