//! Bounded retry policy and call timeouts.

use std::future::Future;
use std::time::Duration;

use crate::{Result, SagaError};

/// Bounded retry with exponential backoff, used for the compensating
/// restock after a failed persistence step.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. At least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each further attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Returns the backoff delay after the given failed attempt
    /// (1-based): `base_delay * 2^(attempt - 1)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Runs a store call under a timeout; expiry maps to `StoreUnavailable`
/// so a hung store never blocks the saga indefinitely.
pub(crate) async fn bounded_store_call<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = order_store::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(SagaError::from),
        Err(_) => Err(SagaError::StoreUnavailable(format!(
            "{what} timed out after {timeout:?}"
        ))),
    }
}

/// Runs an inventory call under a timeout; expiry maps to
/// `InventoryUnavailable`.
pub(crate) async fn bounded_inventory_call<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, crate::inventory::InventoryError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(SagaError::from),
        Err(_) => Err(SagaError::InventoryUnavailable(format!(
            "{what} timed out after {timeout:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_bounded_store_call_times_out() {
        let result: Result<()> = bounded_store_call(
            Duration::from_millis(5),
            "find_order_by_id",
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;

        match result {
            Err(SagaError::StoreUnavailable(reason)) => {
                assert!(reason.contains("find_order_by_id"));
            }
            other => panic!("expected StoreUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bounded_inventory_call_passes_through() {
        let result = bounded_inventory_call(Duration::from_secs(1), "fetch_snapshots", async {
            Ok(42)
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
    }
}
