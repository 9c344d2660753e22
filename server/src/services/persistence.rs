//! Persistence service: bounded retry around room store calls.
//!
//! DESIGN
//! ======
//! Every store call made on behalf of a client goes through [`with_retry`]:
//! a fixed number of attempts with linear back-off (`attempt * base`).
//! Callers hold the room lock across the retries so operations on one room
//! stay strictly ordered.
//!
//! ERROR HANDLING
//! ==============
//! Intermediate failures are logged at `warn`; the final failure is logged at
//! `error` and returned so the caller can send a retryable error frame.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::config::PersistConfig;
use crate::store::StoreError;

/// Run `op` until it succeeds or `config.retries` attempts are exhausted.
///
/// # Errors
///
/// Returns the last [`StoreError`] when every attempt failed.
pub async fn with_retry<T, F, Fut>(config: PersistConfig, label: &'static str, mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let attempts = config.retries.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(error = %e, op = label, attempt, total = attempts, "store call failed; retrying");
                tokio::time::sleep(Duration::from_millis((attempt as u64) * config.retry_base_ms)).await;
                attempt += 1;
            }
            Err(e) => {
                error!(error = %e, op = label, attempts, "store call failed after retries");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
