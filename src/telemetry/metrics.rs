//! Prometheus metrics
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! every call is a no-op, so library code can record unconditionally.

use std::time::Duration;

/// Monotonic counters
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Markets created
    MarketsCreated,
    /// Successful acquires
    Acquires,
    /// Successful releases
    Releases,
    /// Winning claims paid
    Claims,
    /// Cancellation refunds paid
    Refunds,
    /// Collateral units skimmed as fees
    FeesCollected,
    /// Collateral units swept to the authority
    FeesWithdrawn,
    /// Collateral units paid out by claims and refunds
    CollateralPaidOut,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Markets still open
    OpenMarkets,
    /// Unswept treasury balance
    TreasuryBalance,
    /// 1 while the ledger is paused
    Paused,
}

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Round trip to the custody service
    Custody,
}

fn counter_name(metric: CounterMetric) -> &'static str {
    match metric {
        CounterMetric::MarketsCreated => "ledger_markets_created_total",
        CounterMetric::Acquires => "ledger_acquire_total",
        CounterMetric::Releases => "ledger_release_total",
        CounterMetric::Claims => "ledger_claims_total",
        CounterMetric::Refunds => "ledger_refunds_total",
        CounterMetric::FeesCollected => "ledger_fees_collected_total",
        CounterMetric::FeesWithdrawn => "ledger_fees_withdrawn_total",
        CounterMetric::CollateralPaidOut => "ledger_collateral_paid_out_total",
    }
}

fn gauge_name(metric: GaugeMetric) -> &'static str {
    match metric {
        GaugeMetric::OpenMarkets => "ledger_open_markets",
        GaugeMetric::TreasuryBalance => "ledger_treasury_balance",
        GaugeMetric::Paused => "ledger_paused",
    }
}

/// Increment a counter
pub fn increment(metric: CounterMetric, value: u64) {
    metrics::counter!(counter_name(metric)).increment(value);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(gauge_name(metric)).set(value);
}

/// Move a gauge by `delta`
pub fn adjust_gauge(metric: GaugeMetric, delta: f64) {
    let gauge = metrics::gauge!(gauge_name(metric));
    if delta >= 0.0 {
        gauge.increment(delta);
    } else {
        gauge.decrement(-delta);
    }
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::Custody => "ledger_custody_latency_ms",
    };
    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1_000.0);
}

/// Count a rejected operation by reason
pub fn record_rejection(operation: &'static str, reason: &'static str) {
    metrics::counter!(
        "ledger_rejections_total",
        "operation" => operation,
        "reason" => reason
    )
    .increment(1);
    tracing::debug!(operation, reason, "Operation rejected");
}
