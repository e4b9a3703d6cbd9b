use bridge_probe_types::{Account, ChainRoute, Uint256};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::expected::PairKey;

/// Result of waiting for an exact expected balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PollOutcome {
    Converged {
        observed: Uint256,
        attempts: u32,
    },
    TimedOut {
        expected: Uint256,
        last_observed: Option<Uint256>,
        last_error: Option<String>,
        attempts: u32,
    },
    Cancelled {
        attempts: u32,
    },
}

impl PollOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, PollOutcome::Converged { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            PollOutcome::Converged { .. } => "converged",
            PollOutcome::TimedOut { .. } => "timed_out",
            PollOutcome::Cancelled { .. } => "cancelled",
        }
    }
}

/// Result of asserting that nothing further arrives
///
/// Exhausting the attempt budget is the successful `Quiet` outcome here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuietOutcome {
    Quiet { attempts: u32 },
    UnexpectedActivity { expected: Uint256, observed: Uint256 },
    Cancelled { attempts: u32 },
}

impl QuietOutcome {
    pub fn is_quiet(&self) -> bool {
        matches!(self, QuietOutcome::Quiet { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuietOutcome::Quiet { .. } => "quiet",
            QuietOutcome::UnexpectedActivity { .. } => "unexpected_activity",
            QuietOutcome::Cancelled { .. } => "cancelled",
        }
    }
}

/// Lifecycle of a single (receiver, chain) verification task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairState {
    Pending,
    Polling,
    Converged,
    TimedOut,
    Cancelled,
}

impl PairState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PairState::Pending | PairState::Polling)
    }
}

impl From<&PollOutcome> for PairState {
    fn from(outcome: &PollOutcome) -> Self {
        match outcome {
            PollOutcome::Converged { .. } => PairState::Converged,
            PollOutcome::TimedOut { .. } => PairState::TimedOut,
            PollOutcome::Cancelled { .. } => PairState::Cancelled,
        }
    }
}

/// Outcome of one verification task
#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub pair: PairKey,
    pub expected: Uint256,
    pub state: PairState,
    pub convergence: PollOutcome,
    pub no_activity: Option<QuietOutcome>,
}

/// Submissions made by one sender on one route
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    pub sender: Account,
    pub route: ChainRoute,
    pub succeeded: u32,
    pub tx_hashes: Vec<String>,
    /// Amount credited to each receiver per successful submission, destination units
    pub credited_per_transfer: Uint256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorActionKind {
    Stop,
    Start,
}

impl ValidatorActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidatorActionKind::Stop => "stop",
            ValidatorActionKind::Start => "start",
        }
    }
}

impl std::fmt::Display for ValidatorActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one scheduled validator action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PerturbationRecord {
    Applied {
        action: ValidatorActionKind,
        validator: usize,
    },
    Failed {
        action: ValidatorActionKind,
        validator: usize,
        reason: String,
    },
    /// The timer had not fired when the run finished
    Abandoned { action: ValidatorActionKind },
    /// The run was cancelled before the timer fired
    Cancelled { action: ValidatorActionKind },
}

/// One entry of the combined run failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunFailure {
    #[error("sender {sender} on {route}: submission {iteration} failed: {reason}")]
    Submission {
        sender: Account,
        route: ChainRoute,
        iteration: u32,
        reason: String,
    },

    #[error("{pair}: expected {expected}, last observed {}: {reason}", display_observed(.last_observed))]
    NotConverged {
        pair: PairKey,
        expected: Uint256,
        last_observed: Option<Uint256>,
        reason: String,
    },

    #[error("{pair} should not receive more tokens: expected {expected}, observed {observed}")]
    UnexpectedActivity {
        pair: PairKey,
        expected: Uint256,
        observed: Uint256,
    },

    #[error("{pair}: verification cancelled")]
    Cancelled { pair: PairKey },

    #[error("validator {validator} {action} failed: {reason}")]
    Perturbation {
        action: ValidatorActionKind,
        validator: usize,
        reason: String,
    },

    #[error("{task} task failed: {reason}")]
    Task { task: String, reason: String },
}

fn display_observed(observed: &Option<Uint256>) -> String {
    observed
        .map(|v| v.to_string())
        .unwrap_or_else(|| "nothing".to_string())
}

/// Every failure of a run, joined
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunError {
    pub failures: Vec<RunFailure>,
}

impl RunError {
    /// `None` when there is nothing to report
    pub fn join(failures: Vec<RunFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    /// Failing (receiver, chain) pairs, in report order
    pub fn failing_pairs(&self) -> Vec<&PairKey> {
        self.failures
            .iter()
            .filter_map(|f| match f {
                RunFailure::NotConverged { pair, .. }
                | RunFailure::UnexpectedActivity { pair, .. }
                | RunFailure::Cancelled { pair } => Some(pair),
                _ => None,
            })
            .collect()
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failure(s)", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  - {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RunError {}

/// Aggregated outcome of a bridging verification run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub routes: Vec<ChainRoute>,
    pub submissions: Vec<SubmissionSummary>,
    pub pairs: Vec<PairReport>,
    pub perturbations: Vec<PerturbationRecord>,
    pub failures: Vec<RunFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn pair(&self, pair: &PairKey) -> Option<&PairReport> {
        self.pairs.iter().find(|p| &p.pair == pair)
    }

    pub fn error(&self) -> Option<RunError> {
        RunError::join(self.failures.clone())
    }

    /// Ok when every pair converged and nothing else failed
    pub fn into_result(self) -> Result<Self, RunError> {
        match RunError::join(self.failures.clone()) {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }

    pub fn total_submitted(&self) -> u32 {
        self.submissions.iter().map(|s| s.succeeded).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(receiver: &str, chain: &str) -> PairKey {
        PairKey::new(Account::new(receiver), chain)
    }

    #[test]
    fn test_run_error_join_empty() {
        assert!(RunError::join(Vec::new()).is_none());
    }

    #[test]
    fn test_run_error_lists_every_failure() {
        let error = RunError::join(vec![
            RunFailure::NotConverged {
                pair: pair("bob", "vector"),
                expected: Uint256::from(30u128),
                last_observed: Some(Uint256::from(20u128)),
                reason: "retry timeout after 100 attempts".to_string(),
            },
            RunFailure::UnexpectedActivity {
                pair: pair("carol", "nexus"),
                expected: Uint256::from(30u128),
                observed: Uint256::from(40u128),
            },
            RunFailure::Perturbation {
                action: ValidatorActionKind::Stop,
                validator: 3,
                reason: "no such validator".to_string(),
            },
        ])
        .unwrap();

        let rendered = error.to_string();
        assert!(rendered.starts_with("3 failure(s)"));
        assert!(rendered.contains("receiver bob on vector: expected 30, last observed 20"));
        assert!(rendered.contains("receiver carol on nexus should not receive more tokens"));
        assert!(rendered.contains("validator 3 stop failed"));

        let failing = error.failing_pairs();
        assert_eq!(failing, vec![&pair("bob", "vector"), &pair("carol", "nexus")]);
    }

    #[test]
    fn test_not_converged_without_observation() {
        let failure = RunFailure::NotConverged {
            pair: pair("bob", "prime"),
            expected: Uint256::from(1u128),
            last_observed: None,
            reason: "balance query failed: down".to_string(),
        };
        assert!(failure.to_string().contains("last observed nothing"));
    }

    #[test]
    fn test_pair_state_from_outcome() {
        let converged = PollOutcome::Converged {
            observed: Uint256::from(30u128),
            attempts: 2,
        };
        assert_eq!(PairState::from(&converged), PairState::Converged);
        assert!(PairState::Converged.is_terminal());
        assert!(!PairState::Polling.is_terminal());
        assert_eq!(converged.label(), "converged");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = QuietOutcome::UnexpectedActivity {
            expected: Uint256::from(30u128),
            observed: Uint256::from(31u128),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "unexpected_activity");
        assert_eq!(json["observed"], "31");
    }
}
