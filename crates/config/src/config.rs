//! Run configuration structures for the bridge-probe harness

use bridge_probe_types::{
    parse_amount, Account, Binary, Ledger, PerturbationSchedule, PollSettings, RunSpec,
    ValidatorAction,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::{ConfigError, Result};

/// Main run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Logging and metrics
    #[serde(default)]
    pub network: NetworkConfig,

    /// Chains by name; routes are derived in name order
    #[serde(default)]
    pub chains: BTreeMap<String, ChainConfig>,

    /// source chain -> destination chains
    #[serde(default)]
    pub routes: BTreeMap<String, Vec<String>>,

    pub accounts: AccountsConfig,

    pub transfer: TransferConfig,

    /// Convergence polling budget
    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub no_activity: NoActivityConfig,

    #[serde(default)]
    pub perturbation: Option<PerturbationConfig>,

    /// Simulated bridge used by the CLI
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,

    #[serde(default)]
    pub metrics_enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Decimal exponent of the chain's smallest unit
    pub decimals: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default)]
    pub senders: Vec<String>,

    #[serde(default)]
    pub receivers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Per-request amount in the source chain's smallest unit
    ///
    /// Kept as a string so that 18-decimal amounts survive every format;
    /// `_` separators are accepted.
    pub amount: String,

    /// Sequential submissions per sender and route
    #[serde(default = "default_repeat")]
    pub repeat: u32,

    /// UTF-8 payload attached to every transfer
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NoActivityConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_no_activity_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

/// Validator stop/start schedule, delays measured from the submit phase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerturbationConfig {
    #[serde(default)]
    pub stop_after_ms: Option<u64>,

    #[serde(default)]
    pub stop_validators: Vec<usize>,

    #[serde(default)]
    pub start_after_ms: Option<u64>,

    #[serde(default)]
    pub start_validators: Vec<usize>,

    #[serde(default)]
    pub resync: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_validators")]
    pub validators: usize,

    #[serde(default = "default_quorum")]
    pub quorum: usize,

    #[serde(default = "default_settlement_delay_ms")]
    pub settlement_delay_ms: u64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_repeat() -> u32 {
    1
}

fn default_max_attempts() -> u32 {
    100
}

fn default_no_activity_attempts() -> u32 {
    12
}

fn default_interval_ms() -> u64 {
    10_000
}

fn default_validators() -> usize {
    4
}

fn default_quorum() -> usize {
    3
}

fn default_settlement_delay_ms() -> u64 {
    1_000
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            metrics_enabled: false,
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            amount: String::new(),
            repeat: default_repeat(),
            metadata: None,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for NoActivityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: default_no_activity_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            validators: default_validators(),
            quorum: default_quorum(),
            settlement_delay_ms: default_settlement_delay_ms(),
        }
    }
}

impl PollingConfig {
    pub fn settings(&self) -> PollSettings {
        PollSettings::new(self.max_attempts, Duration::from_millis(self.interval_ms))
    }
}

impl NoActivityConfig {
    pub fn settings(&self) -> PollSettings {
        PollSettings::new(self.max_attempts, Duration::from_millis(self.interval_ms))
    }
}

impl PerturbationConfig {
    pub fn schedule(&self) -> PerturbationSchedule {
        let action = |after: Option<u64>, validators: &[usize]| {
            after.map(|ms| ValidatorAction {
                after: Duration::from_millis(ms),
                validators: validators.to_vec(),
            })
        };

        PerturbationSchedule {
            stop: action(self.stop_after_ms, &self.stop_validators),
            start: action(self.start_after_ms, &self.start_validators),
            resync: self.resync,
        }
    }
}

impl RunConfig {
    /// Ledgers in chain name order
    pub fn ledgers(&self) -> Vec<Ledger> {
        self.chains
            .iter()
            .map(|(name, chain)| Ledger::new(name.clone(), chain.decimals))
            .collect()
    }

    pub fn settlement_delay(&self) -> Duration {
        Duration::from_millis(self.simulation.settlement_delay_ms)
    }

    /// Build the run specification described by this configuration
    ///
    /// Call `validate_config` first; this only fails on an unparseable amount.
    pub fn to_run_spec(&self) -> Result<RunSpec> {
        let amount = parse_amount(&self.transfer.amount)
            .map_err(|e| ConfigError::ValidationError(format!("transfer.amount: {e}")))?;

        let routing: HashMap<String, Vec<String>> = self
            .routes
            .iter()
            .map(|(source, destinations)| (source.clone(), destinations.clone()))
            .collect();

        let mut spec = RunSpec::new(
            self.accounts.senders.iter().map(Account::new).collect(),
            self.accounts.receivers.iter().map(Account::new).collect(),
            self.ledgers(),
            routing,
            amount,
        )
        .with_repeat(self.transfer.repeat)
        .with_convergence(self.polling.settings())
        .with_no_activity(self.no_activity.settings())
        .with_no_further_activity(self.no_activity.enabled);

        if let Some(metadata) = &self.transfer.metadata {
            spec = spec.with_metadata(Binary::from(metadata.as_bytes()));
        }

        if let Some(perturbation) = &self.perturbation {
            let schedule = perturbation.schedule();
            if !schedule.is_empty() {
                spec = spec.with_perturbation(schedule);
            }
        }

        Ok(spec)
    }
}
