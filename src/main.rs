use binary_ledger::cli::{Cli, Commands};
use binary_ledger::config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    binary_ledger::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Simulate(args) => {
            tracing::info!("Starting simulation");
            args.execute(&config).await?;
        }
        Commands::Replay(args) => {
            args.execute().await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Authorities: {}", config.ledger.authorities.join(", "));
            println!("  Custody timeout: {}ms", config.ledger.custody_timeout_ms);
            println!(
                "  Fees: acquire={}%, release={}%",
                config.fees.acquire_rate * rust_decimal_macros::dec!(100),
                config.fees.release_rate * rust_decimal_macros::dec!(100)
            );
            if config.audit.enabled {
                println!("  Audit: {}", config.audit.output_path.display());
            } else {
                println!("  Audit: disabled");
            }
            println!(
                "  Logging: {} ({:?})",
                config.telemetry.log_level, config.telemetry.log_format
            );
            match config.telemetry.metrics_port {
                Some(port) => println!("  Metrics: 0.0.0.0:{}", port),
                None => println!("  Metrics: disabled"),
            }
        }
    }

    Ok(())
}
