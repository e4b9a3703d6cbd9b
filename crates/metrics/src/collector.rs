use std::time::Duration;

use prometheus::{Encoder, Registry, TextEncoder};

use crate::metrics::*;

/// Metrics collector for bridging verification runs
pub struct MetricsCollector {
    registry: Registry,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Self {
        let registry = Registry::new();
        Self { registry }
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Registry) -> Self {
        Self { registry }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RUN METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_run_started(&self) {
        RUNS_STARTED.inc();
    }

    /// Record a finished run with its wall-clock duration
    pub fn record_run_finished(&self, success: bool, duration: Duration) {
        let result = if success { "success" } else { "failure" };
        RUNS_FINISHED.with_label_values(&[result]).inc();
        RUN_DURATION.observe(duration.as_millis() as f64);
    }

    pub fn record_phase_duration(&self, phase: RunPhase, duration: Duration) {
        PHASE_DURATION
            .with_label_values(&[phase.as_str()])
            .observe(duration.as_millis() as f64);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SUBMISSION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_submission(&self, route: &str, success: bool) {
        let outcome = if success { "submitted" } else { "failed" };
        SUBMISSIONS.with_label_values(&[route, outcome]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VERIFICATION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_balance_query(&self, chain: &str, success: bool) {
        let outcome = if success { "ok" } else { "error" };
        BALANCE_QUERIES.with_label_values(&[chain, outcome]).inc();
    }

    pub fn record_pair_polling(&self) {
        PAIRS_POLLING.inc();
    }

    /// Record the terminal state of a verification task
    pub fn record_pair_outcome(&self, chain: &str, outcome: &str) {
        PAIRS_POLLING.dec();
        PAIR_OUTCOMES.with_label_values(&[chain, outcome]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PERTURBATION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_validator_action(&self, action: &str, success: bool) {
        let outcome = if success { "ok" } else { "error" };
        VALIDATOR_ACTIONS.with_label_values(&[action, outcome]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPORT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Export metrics in Prometheus text format
    ///
    /// Includes the process-wide metrics and anything registered on this
    /// collector's own registry.
    pub fn export_metrics(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut metric_families = prometheus::gather();
        metric_families.extend(self.registry.gather());
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Phase of a verification run for phase-specific timings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Seed,
    Submit,
    Verify,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Seed => "seed",
            RunPhase::Submit => "submit",
            RunPhase::Verify => "verify",
        }
    }
}

/// Metrics error types
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
}
