//! Collaborator boundary consumed by the orchestrator

use async_trait::async_trait;
use bridge_probe_types::{Account, TransferRequest, TxHash, Uint256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("transfer submission failed: {0}")]
    Submission(String),

    #[error("balance query failed: {0}")]
    BalanceQuery(String),

    #[error("validator {index} {action} failed: {reason}")]
    Validator {
        index: usize,
        action: &'static str,
        reason: String,
    },

    #[error("unknown chain: {0}")]
    UnknownChain(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Issues bridging transactions
///
/// Called concurrently by independent submit tasks. The orchestrator never
/// retries a submission, so implementations decide whether their own
/// transport-level retries are safe.
#[async_trait]
pub trait TransferSubmitter: Send + Sync {
    async fn submit(&self, request: &TransferRequest) -> Result<TxHash, ClientError>;
}

/// Reads balances; assumed eventually consistent and safe to repeat
#[async_trait]
pub trait BalanceQuery: Send + Sync {
    async fn get_balance(&self, account: &Account, chain_id: &str) -> Result<Uint256, ClientError>;
}

/// Stops and starts destination-side validators
#[async_trait]
pub trait ValidatorControl: Send + Sync {
    async fn stop_validator(&self, index: usize) -> Result<(), ClientError>;

    async fn start_validator(&self, index: usize, resync: bool) -> Result<(), ClientError>;
}
