use cosmwasm_std::{Binary, Uint256};
use std::collections::HashMap;
use std::time::Duration;

use crate::{chain_routes, destination_chains, Account, ChainRoute, Ledger};

/// Attempt budget and fixed interval for a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollSettings {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Budget used when waiting for an expected balance
    pub fn convergence_default() -> Self {
        Self::new(100, Duration::from_secs(10))
    }

    /// Budget used when asserting that nothing further arrives
    pub fn no_activity_default() -> Self {
        Self::new(12, Duration::from_secs(10))
    }
}

/// One scheduled validator stop or start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorAction {
    /// Delay measured from the start of the submit phase
    pub after: Duration,

    /// Indices of the validators to act on
    pub validators: Vec<usize>,
}

/// Validator availability perturbations injected during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerturbationSchedule {
    pub stop: Option<ValidatorAction>,
    pub start: Option<ValidatorAction>,

    /// Passed through to the collaborator when restarting validators
    pub resync: bool,
}

impl PerturbationSchedule {
    pub fn is_empty(&self) -> bool {
        self.stop.as_ref().map_or(true, |a| a.validators.is_empty())
            && self.start.as_ref().map_or(true, |a| a.validators.is_empty())
    }
}

/// Everything a bridging verification run needs
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub senders: Vec<Account>,
    pub receivers: Vec<Account>,

    /// Chain set, in the order used to derive routes
    pub ledgers: Vec<Ledger>,

    /// source chain -> destination chains
    pub routing: HashMap<String, Vec<String>>,

    /// Per-request amount in the source ledger's smallest unit
    pub amount: Uint256,

    /// Sequential submissions per sender and route
    pub repeat: u32,

    pub metadata: Option<Binary>,
    pub perturbation: Option<PerturbationSchedule>,

    /// After convergence, also assert that no further funds arrive
    pub expect_no_further_activity: bool,

    pub convergence: PollSettings,
    pub no_activity: PollSettings,
}

impl RunSpec {
    pub fn new(
        senders: Vec<Account>,
        receivers: Vec<Account>,
        ledgers: Vec<Ledger>,
        routing: HashMap<String, Vec<String>>,
        amount: Uint256,
    ) -> Self {
        Self {
            senders,
            receivers,
            ledgers,
            routing,
            amount,
            repeat: 1,
            metadata: None,
            perturbation: None,
            expect_no_further_activity: false,
            convergence: PollSettings::convergence_default(),
            no_activity: PollSettings::no_activity_default(),
        }
    }

    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_metadata(mut self, metadata: Binary) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_perturbation(mut self, perturbation: PerturbationSchedule) -> Self {
        self.perturbation = Some(perturbation);
        self
    }

    pub fn with_no_further_activity(mut self, enabled: bool) -> Self {
        self.expect_no_further_activity = enabled;
        self
    }

    pub fn with_convergence(mut self, settings: PollSettings) -> Self {
        self.convergence = settings;
        self
    }

    pub fn with_no_activity(mut self, settings: PollSettings) -> Self {
        self.no_activity = settings;
        self
    }

    pub fn chain_ids(&self) -> Vec<String> {
        self.ledgers.iter().map(|l| l.chain_id.clone()).collect()
    }

    pub fn ledger(&self, chain_id: &str) -> Option<&Ledger> {
        self.ledgers.iter().find(|l| l.chain_id == chain_id)
    }

    pub fn routes(&self) -> Vec<ChainRoute> {
        chain_routes(&self.chain_ids(), &self.routing)
    }

    pub fn destination_chains(&self) -> Vec<String> {
        destination_chains(&self.chain_ids(), &self.routing)
    }
}
