//! Bounded retry execution for the bridge-probe harness
//!
//! - `RetryPolicy`: attempt budget with a fixed interval between attempts
//! - `execute_with_retry`: runs a fallible async operation under a policy,
//!   aborting promptly when a `CancellationToken` fires

pub mod executor;
pub mod policy;

pub use executor::{execute_with_retry, RetryError};
pub use policy::RetryPolicy;

pub use tokio_util::sync::CancellationToken;
