//! In-memory bridge used by tests and the CLI's simulated mode
//!
//! Transfers are parked on submission and credited lazily, on the first
//! balance read after the settlement delay has elapsed while a quorum of
//! validators is running. Source-side balances are not debited.

use async_trait::async_trait;
use bridge_probe_types::{Account, Ledger, Rounding, TransferRequest, TxHash, Uint256};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::client::{BalanceQuery, ClientError, TransferSubmitter, ValidatorControl};

#[derive(Debug, Clone)]
pub struct SimulatedBridgeConfig {
    /// Time between submission and the earliest possible credit
    pub settlement_delay: Duration,

    pub validators: usize,

    /// Running validators required for anything to settle
    pub quorum: usize,
}

impl Default for SimulatedBridgeConfig {
    fn default() -> Self {
        Self {
            settlement_delay: Duration::from_millis(50),
            validators: 4,
            quorum: 3,
        }
    }
}

#[derive(Debug)]
struct PendingCredit {
    receivers: Vec<Account>,
    chain_id: String,
    amount: Uint256,
    ready_at: Instant,
}

#[derive(Debug, Default)]
struct BridgeState {
    balances: HashMap<(Account, String), Uint256>,
    pending: Vec<PendingCredit>,
    running: Vec<bool>,
    submissions: u32,
    failing_submissions: HashSet<u32>,
    failing_balance_queries: u32,
}

impl BridgeState {
    fn has_quorum(&self, quorum: usize) -> bool {
        self.running.iter().filter(|r| **r).count() >= quorum
    }

    fn settle(&mut self, quorum: usize, now: Instant) {
        if self.pending.is_empty() || !self.has_quorum(quorum) {
            return;
        }

        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|credit| credit.ready_at <= now);
        self.pending = waiting;

        for credit in ready {
            for receiver in credit.receivers {
                let balance = self
                    .balances
                    .entry((receiver, credit.chain_id.clone()))
                    .or_insert_with(Uint256::zero);
                *balance = balance.saturating_add(credit.amount);
            }
        }
    }
}

/// Simulated multi-chain bridge implementing every collaborator trait
pub struct SimulatedBridge {
    ledgers: HashMap<String, Ledger>,
    config: SimulatedBridgeConfig,
    state: RwLock<BridgeState>,
}

impl SimulatedBridge {
    pub fn new(ledgers: Vec<Ledger>, config: SimulatedBridgeConfig) -> Self {
        let state = BridgeState {
            running: vec![true; config.validators],
            ..Default::default()
        };

        Self {
            ledgers: ledgers
                .into_iter()
                .map(|l| (l.chain_id.clone(), l))
                .collect(),
            config,
            state: RwLock::new(state),
        }
    }

    pub fn config(&self) -> &SimulatedBridgeConfig {
        &self.config
    }

    pub async fn set_balance(&self, account: &Account, chain_id: &str, amount: Uint256) {
        self.state
            .write()
            .await
            .balances
            .insert((account.clone(), chain_id.to_string()), amount);
    }

    /// Credit an account immediately, outside of any bridging transfer
    pub async fn inject_credit(&self, account: &Account, chain_id: &str, amount: Uint256) {
        let mut state = self.state.write().await;
        let balance = state
            .balances
            .entry((account.clone(), chain_id.to_string()))
            .or_insert_with(Uint256::zero);
        *balance = balance.saturating_add(amount);
    }

    /// Make the `n`-th submission (1-based, counted across all senders) fail
    pub async fn fail_submission(&self, n: u32) {
        self.state.write().await.failing_submissions.insert(n);
    }

    /// Make the next `count` balance queries fail
    pub async fn fail_next_balance_queries(&self, count: u32) {
        self.state.write().await.failing_balance_queries = count;
    }

    /// Number of submissions seen so far, failed ones included
    pub async fn submissions(&self) -> u32 {
        self.state.read().await.submissions
    }

    pub async fn pending_transfers(&self) -> usize {
        self.state.read().await.pending.len()
    }

    pub async fn running_validators(&self) -> Vec<usize> {
        self.state
            .read()
            .await
            .running
            .iter()
            .enumerate()
            .filter_map(|(i, running)| running.then_some(i))
            .collect()
    }

    fn ledger(&self, chain_id: &str) -> Result<&Ledger, ClientError> {
        self.ledgers
            .get(chain_id)
            .ok_or_else(|| ClientError::UnknownChain(chain_id.to_string()))
    }

    async fn set_running(
        &self,
        index: usize,
        action: &'static str,
        running: bool,
    ) -> Result<(), ClientError> {
        let mut state = self.state.write().await;
        let slot = state
            .running
            .get_mut(index)
            .ok_or_else(|| ClientError::Validator {
                index,
                action,
                reason: "no such validator".to_string(),
            })?;
        *slot = running;
        Ok(())
    }
}

#[async_trait]
impl TransferSubmitter for SimulatedBridge {
    async fn submit(&self, request: &TransferRequest) -> Result<TxHash, ClientError> {
        let source = self.ledger(&request.source)?;
        let destination = self.ledger(&request.destination)?;
        let amount = source
            .convert_to(request.amount, destination, Rounding::Truncate)
            .map_err(|e| ClientError::Submission(e.to_string()))?;

        let mut state = self.state.write().await;
        state.submissions += 1;
        let n = state.submissions;

        if state.failing_submissions.contains(&n) {
            debug!(submission = n, "injected submission failure");
            return Err(ClientError::Submission(format!(
                "submission {n} rejected by source chain"
            )));
        }

        state.pending.push(PendingCredit {
            receivers: request.receivers.clone(),
            chain_id: request.destination.clone(),
            amount,
            ready_at: Instant::now() + self.config.settlement_delay,
        });

        Ok(format!("0x{n:064x}"))
    }
}

#[async_trait]
impl BalanceQuery for SimulatedBridge {
    async fn get_balance(&self, account: &Account, chain_id: &str) -> Result<Uint256, ClientError> {
        self.ledger(chain_id)?;

        let mut state = self.state.write().await;
        if state.failing_balance_queries > 0 {
            state.failing_balance_queries -= 1;
            return Err(ClientError::BalanceQuery(format!(
                "{chain_id} node unavailable"
            )));
        }

        state.settle(self.config.quorum, Instant::now());

        Ok(state
            .balances
            .get(&(account.clone(), chain_id.to_string()))
            .copied()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ValidatorControl for SimulatedBridge {
    async fn stop_validator(&self, index: usize) -> Result<(), ClientError> {
        self.set_running(index, "stop", false).await?;
        info!(validator = index, "simulated validator stopped");
        Ok(())
    }

    async fn start_validator(&self, index: usize, resync: bool) -> Result<(), ClientError> {
        self.set_running(index, "start", true).await?;
        info!(validator = index, resync, "simulated validator started");
        Ok(())
    }
}
