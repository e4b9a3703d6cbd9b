use std::fmt::Display;
use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::RetryPolicy;

#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The budget ran out; carries the failure of the final attempt
    #[error("retry timeout after {attempts} attempts: {last}")]
    Timeout { attempts: u32, last: E },

    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl<E> RetryError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RetryError::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Timeout { attempts, .. } | RetryError::Cancelled { attempts } => *attempts,
        }
    }

    /// The last underlying failure, if the budget was exhausted
    pub fn into_last(self) -> Option<E> {
        match self {
            RetryError::Timeout { last, .. } => Some(last),
            RetryError::Cancelled { .. } => None,
        }
    }
}

/// Run `operation` until it succeeds, the budget is exhausted or `cancel` fires
///
/// `operation` receives the 1-based attempt number and may be invoked up to
/// `policy.max_attempts()` times, so it must be safe to repeat. Cancellation
/// is checked before every attempt and raced against every wait.
pub async fn execute_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled { attempts: attempt });
        }

        attempt += 1;
        let error = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if attempt >= max_attempts {
            warn!(attempts = attempt, error = %error, "retry budget exhausted");
            return Err(RetryError::Timeout {
                attempts: attempt,
                last: error,
            });
        }

        debug!(attempt, max_attempts, error = %error, "attempt failed, retrying");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(RetryError::Cancelled { attempts: attempt });
            }
            _ = tokio::time::sleep(policy.interval()) => {}
        }
    }
}
