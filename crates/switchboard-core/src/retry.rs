//! Bounded exponential backoff for connect attempts.
//!
//! Retry lives with the connection contract, not the pool: the pool and
//! manager never retry automatically. Defaults match the historical
//! behavior of the harness (3 attempts, 4s base, 10s cap).

use std::time::Duration;

use tracing::warn;

use crate::connection::Connection;
use crate::error::ConnectionError;

/// Attempt budget and backoff curve for [`connect_with_retry`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no backoff.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Backoff before the given attempt (1-based): base * 2^(attempt-1),
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Connect with bounded retries. Exhaustion yields a hard
/// [`ConnectionError::RetriesExhausted`] carrying the last failure.
pub async fn connect_with_retry(
    conn: &dyn Connection,
    policy: &RetryPolicy,
) -> Result<(), ConnectionError> {
    let mut last_error: Option<ConnectionError> = None;

    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.delay_for(attempt - 1)).await;
        }

        match conn.connect().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(
                    service_type = conn.service_type(),
                    connection_id = conn.connection_id(),
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "[Retry] Connect attempt failed"
                );
                last_error = Some(e);
            }
        }
    }

    Err(ConnectionError::RetriesExhausted {
        attempts: policy.max_attempts,
        source: Box::new(last_error.unwrap_or_else(|| {
            ConnectionError::Other("connect failed with no recorded error".to_string())
        })),
    })
}
