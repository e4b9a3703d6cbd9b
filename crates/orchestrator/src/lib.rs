//! Bridging verification orchestrator
//!
//! Submits concurrent bridging transfers, optionally perturbs destination
//! validators, then verifies that every receiver converges to exactly the
//! expected balance on every destination chain.

pub mod client;
pub mod error;
pub mod expected;
pub mod orchestrator;
pub mod perturbation;
pub mod poll;
pub mod report;
pub mod simulated;


// Re-export main types
pub use client::{BalanceQuery, ClientError, TransferSubmitter, ValidatorControl};
pub use error::OrchestratorError;
pub use expected::{ExpectedBalances, ExpectedSnapshot, PairKey};
pub use orchestrator::{
    retry_policy, BridgingOrchestrator, BridgingOrchestratorBuilder, BuilderError,
    OrchestratorConfig,
};
pub use perturbation::PerturbationTimers;
pub use poll::{wait_for_exact_amount, wait_for_greater_amount};
pub use report::{
    PairReport, PairState, PerturbationRecord, PollOutcome, QuietOutcome, RunError, RunFailure,
    RunReport, SubmissionSummary, ValidatorActionKind,
};
pub use simulated::{SimulatedBridge, SimulatedBridgeConfig};
