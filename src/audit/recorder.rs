//! JSON-lines audit recorder

use super::LedgerEvent;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

/// Longest accepted gap between interval flushes
pub const MAX_FLUSH_INTERVAL_SECS: u64 = 86_400;

/// Interval flush period, clamped to [1s, MAX_FLUSH_INTERVAL_SECS]
fn flush_period(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(1, MAX_FLUSH_INTERVAL_SECS))
}

/// Configuration for audit recording
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// File the events are appended to
    pub output_path: PathBuf,
    /// Buffer size before flushing
    pub buffer_size: usize,
    /// Maximum time between flushes
    pub flush_interval_secs: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./audit/ledger.jsonl"),
            buffer_size: 64,
            flush_interval_secs: 5,
        }
    }
}

/// Recording statistics
#[derive(Debug, Default, Clone)]
pub struct RecorderStats {
    pub events_received: u64,
    pub events_written: u64,
    pub flushes: u64,
    pub write_errors: u64,
    pub last_flush: Option<chrono::DateTime<Utc>>,
}

/// Streams audit events to disk from a background task
pub struct AuditRecorder {
    config: RecorderConfig,
    tx: mpsc::Sender<LedgerEvent>,
    stats: Arc<RwLock<RecorderStats>>,
    writer: JoinHandle<()>,
}

impl AuditRecorder {
    /// Create a recorder and spawn its writer task
    pub fn new(config: RecorderConfig) -> Self {
        let (tx, rx) = mpsc::channel(10_000);
        let stats = Arc::new(RwLock::new(RecorderStats::default()));

        let writer_stats = stats.clone();
        let writer_config = config.clone();
        let writer = tokio::spawn(async move {
            Self::run_writer(rx, writer_config, writer_stats).await;
        });

        Self {
            config,
            tx,
            stats,
            writer,
        }
    }

    /// Sender to hand to an [`super::AuditLog`]
    pub fn sink(&self) -> mpsc::Sender<LedgerEvent> {
        self.tx.clone()
    }

    /// Record an event directly
    pub async fn record(&self, event: LedgerEvent) -> anyhow::Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send audit event: {}", e))?;
        Ok(())
    }

    pub fn output_path(&self) -> &Path {
        &self.config.output_path
    }

    /// Get current statistics
    pub async fn stats(&self) -> RecorderStats {
        self.stats.read().await.clone()
    }

    /// Flush what is buffered and stop the writer.
    ///
    /// Every sink handed out must be dropped first, otherwise the writer
    /// keeps waiting for events.
    pub async fn shutdown(self) -> anyhow::Result<RecorderStats> {
        drop(self.tx);
        self.writer.await?;
        let stats = self.stats.read().await.clone();
        Ok(stats)
    }

    /// Run the writer task
    async fn run_writer(
        mut rx: mpsc::Receiver<LedgerEvent>,
        config: RecorderConfig,
        stats: Arc<RwLock<RecorderStats>>,
    ) {
        let mut buffer: Vec<String> = Vec::with_capacity(config.buffer_size);
        let period = flush_period(config.flush_interval_secs);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Some(event) => {
                            {
                                let mut s = stats.write().await;
                                s.events_received += 1;
                            }

                            match serde_json::to_string(&event) {
                                Ok(line) => buffer.push(line),
                                Err(e) => {
                                    tracing::error!(sequence = event.sequence, error = %e, "Failed to encode audit event");
                                }
                            }

                            if buffer.len() >= config.buffer_size {
                                Self::flush_buffer(&mut buffer, &config.output_path, &stats).await;
                                ticker.reset();
                            }
                        }
                        None => {
                            // Channel closed, flush remaining and exit
                            Self::flush_buffer(&mut buffer, &config.output_path, &stats).await;
                            tracing::info!("Audit writer shutting down");
                            break;
                        }
                    }
                }

                _ = ticker.tick() => {
                    Self::flush_buffer(&mut buffer, &config.output_path, &stats).await;
                }
            }
        }
    }

    /// Append buffered lines to the output file
    async fn flush_buffer(
        buffer: &mut Vec<String>,
        path: &Path,
        stats: &Arc<RwLock<RecorderStats>>,
    ) {
        if buffer.is_empty() {
            return;
        }

        let count = buffer.len();
        let mut payload = buffer.join("\n");
        payload.push('\n');

        match Self::append(path, payload.as_bytes()).await {
            Ok(()) => {
                let mut s = stats.write().await;
                s.events_written += count as u64;
                s.flushes += 1;
                s.last_flush = Some(Utc::now());
                tracing::debug!(count, path = ?path, "Flushed audit events");
            }
            Err(e) => {
                stats.write().await.write_errors += 1;
                tracing::error!(error = %e, path = ?path, "Failed to write audit events");
            }
        }

        buffer.clear();
    }

    async fn append(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }
}
