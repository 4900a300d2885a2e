//! Configuration types for binary-ledger

use crate::admin::StaticAuthority;
use crate::audit::{RecorderConfig, MAX_FLUSH_INTERVAL_SECS};
use crate::ledger::LedgerSettings;
use crate::telemetry::LogFormat;
use crate::trade::FeeSchedule;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub fees: FeeConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Ledger instance configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Principals holding the authority role
    #[serde(default = "default_authorities")]
    pub authorities: Vec<String>,

    /// Upper bound on each custody call (milliseconds)
    #[serde(default = "default_custody_timeout_ms")]
    pub custody_timeout_ms: u64,
}

fn default_authorities() -> Vec<String> {
    vec!["authority".to_string()]
}
fn default_custody_timeout_ms() -> u64 {
    2_000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            authorities: default_authorities(),
            custody_timeout_ms: default_custody_timeout_ms(),
        }
    }
}

/// Fee rates, each a fraction in [0, 1)
#[derive(Debug, Clone, Deserialize)]
pub struct FeeConfig {
    #[serde(default = "default_acquire_rate")]
    pub acquire_rate: Decimal,

    #[serde(default)]
    pub release_rate: Decimal,
}

fn default_acquire_rate() -> Decimal {
    Decimal::new(2, 2) // 0.02 = 2%
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            acquire_rate: default_acquire_rate(),
            release_rate: Decimal::ZERO,
        }
    }
}

/// Audit file recording
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_audit_path")]
    pub output_path: PathBuf,

    /// Events buffered before a flush
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("./audit/ledger.jsonl")
}
fn default_buffer_size() -> usize {
    64
}
fn default_flush_interval_secs() -> u64 {
    5
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_path: default_audit_path(),
            buffer_size: default_buffer_size(),
            flush_interval_secs: default_flush_interval_secs(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus exporter port; no exporter when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the ledger cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.fee_schedule().is_valid() {
            anyhow::bail!(
                "Fee rates must lie in [0, 1): acquire={}, release={}",
                self.fees.acquire_rate,
                self.fees.release_rate
            );
        }
        if self.ledger.custody_timeout_ms == 0 {
            anyhow::bail!("custody_timeout_ms must be greater than zero");
        }
        if self.audit.enabled && self.audit.buffer_size == 0 {
            anyhow::bail!("audit buffer_size must be greater than zero");
        }
        if !(1..=MAX_FLUSH_INTERVAL_SECS).contains(&self.audit.flush_interval_secs) {
            anyhow::bail!(
                "audit flush_interval_secs must lie in [1, {}]: {}",
                MAX_FLUSH_INTERVAL_SECS,
                self.audit.flush_interval_secs
            );
        }
        Ok(())
    }

    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule::new(self.fees.acquire_rate, self.fees.release_rate)
    }

    pub fn custody_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger.custody_timeout_ms)
    }

    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            fees: self.fee_schedule(),
            custody_timeout: self.custody_timeout(),
        }
    }

    pub fn authority(&self) -> StaticAuthority {
        StaticAuthority::new(self.ledger.authorities.iter().cloned())
    }

    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            output_path: self.audit.output_path.clone(),
            buffer_size: self.audit.buffer_size,
            flush_interval_secs: self.audit.flush_interval_secs,
        }
    }
}
