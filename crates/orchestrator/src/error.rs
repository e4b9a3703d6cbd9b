use bridge_probe_types::AmountError;
use thiserror::Error;

use crate::client::ClientError;
use crate::report::RunError;

/// Errors that abort a run before any verdict can be reached
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid run spec: {reason}")]
    InvalidSpec { reason: String },

    #[error("pre-run balance of {pair} unavailable after {attempts} attempts: {reason}")]
    PreRunBalance {
        pair: String,
        attempts: u32,
        reason: String,
    },

    #[error("amount conversion failed on {route}: {source}")]
    Conversion {
        route: String,
        #[source]
        source: AmountError,
    },

    #[error("no expected balance seeded for {pair}")]
    UnknownPair { pair: String },

    #[error("expected balance overflow for {pair}")]
    ExpectedOverflow { pair: String },

    #[error("run cancelled during {phase}")]
    Cancelled { phase: &'static str },

    #[error("submission failed: {source}")]
    Submission {
        #[from]
        source: ClientError,
    },

    #[error("run failed: {0}")]
    Run(#[from] RunError),
}

impl OrchestratorError {
    pub fn invalid_spec(reason: impl Into<String>) -> Self {
        OrchestratorError::InvalidSpec {
            reason: reason.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrchestratorError::Cancelled { .. })
    }
}
