use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

lazy_static! {
    // ═══════════════════════════════════════════════════════════════════════════
    // RUN METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Total number of verification runs started
    pub static ref RUNS_STARTED: IntCounter = register_int_counter!(
        "bridge_probe_runs_started_total",
        "Total number of bridging verification runs started"
    )
    .unwrap();

    /// Finished runs by result
    pub static ref RUNS_FINISHED: IntCounterVec = register_int_counter_vec!(
        "bridge_probe_runs_finished_total",
        "Total number of bridging verification runs finished, by result",
        &["result"]
    )
    .unwrap();

    /// Run duration in milliseconds
    pub static ref RUN_DURATION: Histogram = register_histogram!(
        "bridge_probe_run_duration_ms",
        "Bridging verification run duration in milliseconds",
        vec![1000.0, 10000.0, 60000.0, 300000.0, 900000.0, 1800000.0, 3600000.0]
    )
    .unwrap();

    /// Duration per run phase in milliseconds
    pub static ref PHASE_DURATION: HistogramVec = register_histogram_vec!(
        "bridge_probe_phase_duration_ms",
        "Duration of each run phase in milliseconds",
        &["phase"],
        vec![100.0, 1000.0, 10000.0, 60000.0, 300000.0, 1800000.0]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // SUBMISSION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Transfer submissions by route and outcome
    pub static ref SUBMISSIONS: IntCounterVec = register_int_counter_vec!(
        "bridge_probe_submissions_total",
        "Total transfer submissions, by route and outcome",
        &["route", "outcome"]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // VERIFICATION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Balance queries by chain and outcome
    pub static ref BALANCE_QUERIES: IntCounterVec = register_int_counter_vec!(
        "bridge_probe_balance_queries_total",
        "Total balance queries issued while polling, by chain and outcome",
        &["chain", "outcome"]
    )
    .unwrap();

    /// Terminal state of every (receiver, chain) verification task
    pub static ref PAIR_OUTCOMES: IntCounterVec = register_int_counter_vec!(
        "bridge_probe_pair_outcomes_total",
        "Verification outcomes per receiver and destination chain",
        &["chain", "outcome"]
    )
    .unwrap();

    /// Verification tasks still polling
    pub static ref PAIRS_POLLING: IntGauge = register_int_gauge!(
        "bridge_probe_pairs_polling",
        "Current number of verification tasks still polling"
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // PERTURBATION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Validator stop/start actions by outcome
    pub static ref VALIDATOR_ACTIONS: IntCounterVec = register_int_counter_vec!(
        "bridge_probe_validator_actions_total",
        "Validator lifecycle actions issued, by action and outcome",
        &["action", "outcome"]
    )
    .unwrap();
}
