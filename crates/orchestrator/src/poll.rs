//! Balance polling on top of the retry executor
//!
//! Both helpers map the executor's timeout to a domain outcome, so callers
//! never have to decide whether an exhausted budget is good or bad news.

use bridge_probe_metrics::MetricsCollector;
use bridge_probe_retry::{execute_with_retry, CancellationToken, RetryError, RetryPolicy};
use bridge_probe_types::{Account, Uint256};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::client::{BalanceQuery, ClientError};
use crate::report::{PollOutcome, QuietOutcome};

/// Why a single poll did not produce the awaited observation
#[derive(Debug, Error)]
enum PollMiss {
    #[error("observed {observed}, expected {expected}")]
    Mismatch { observed: Uint256, expected: Uint256 },

    #[error(transparent)]
    Query(#[from] ClientError),
}

async fn observe<B>(
    balances: &B,
    account: &Account,
    chain_id: &str,
    metrics: Option<&MetricsCollector>,
) -> Result<Uint256, ClientError>
where
    B: BalanceQuery + ?Sized,
{
    let result = balances.get_balance(account, chain_id).await;
    if let Some(metrics) = metrics {
        metrics.record_balance_query(chain_id, result.is_ok());
    }
    result
}

/// Poll until the balance of `account` on `chain_id` equals `expected`
///
/// Query errors count as failed attempts. The last successfully observed
/// balance is carried into `TimedOut`.
pub async fn wait_for_exact_amount<B>(
    balances: &B,
    account: &Account,
    chain_id: &str,
    expected: Uint256,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    metrics: Option<&MetricsCollector>,
) -> PollOutcome
where
    B: BalanceQuery + ?Sized,
{
    let last_observed = &Mutex::new(None);

    let result = execute_with_retry(policy, cancel, move |attempt| async move {
        let observed = observe(balances, account, chain_id, metrics).await?;
        *last_observed.lock().await = Some(observed);

        debug!(
            account = %account,
            chain = chain_id,
            attempt,
            observed = %observed,
            expected = %expected,
            "polled balance"
        );

        if observed == expected {
            Ok((observed, attempt))
        } else {
            Err(PollMiss::Mismatch { observed, expected })
        }
    })
    .await;

    match result {
        Ok((observed, attempts)) => PollOutcome::Converged { observed, attempts },
        Err(RetryError::Timeout { attempts, last }) => PollOutcome::TimedOut {
            expected,
            last_observed: *last_observed.lock().await,
            last_error: Some(last.to_string()),
            attempts,
        },
        Err(RetryError::Cancelled { attempts }) => PollOutcome::Cancelled { attempts },
    }
}

/// Poll for the whole budget, reporting any balance above `expected`
///
/// Reaching the end of the budget is the success case. A balance at or below
/// `expected` and query errors both keep polling.
pub async fn wait_for_greater_amount<B>(
    balances: &B,
    account: &Account,
    chain_id: &str,
    expected: Uint256,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    metrics: Option<&MetricsCollector>,
) -> QuietOutcome
where
    B: BalanceQuery + ?Sized,
{
    let result = execute_with_retry(policy, cancel, move |_attempt| async move {
        let observed = observe(balances, account, chain_id, metrics).await?;
        if observed > expected {
            Ok(observed)
        } else {
            Err(PollMiss::Mismatch { observed, expected })
        }
    })
    .await;

    match result {
        Ok(observed) => QuietOutcome::UnexpectedActivity { expected, observed },
        Err(RetryError::Timeout { attempts, .. }) => QuietOutcome::Quiet { attempts },
        Err(RetryError::Cancelled { attempts }) => QuietOutcome::Cancelled { attempts },
    }
}
