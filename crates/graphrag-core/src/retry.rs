//! Bounded retry with exponential backoff
//!
//! All waiting goes through `tokio::time::sleep`, so tests can drive it with
//! a paused clock.

use graphrag_config::VectorIndexConfig;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Upper bound for a single delay
    pub max_delay: Duration,
    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(300),
            max_delay: Duration::from_millis(300),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Readiness polling policy from `[vector_index]`
    pub fn from_index_config(config: &VectorIndexConfig) -> Self {
        Self {
            max_attempts: config.ready_max_attempts.max(1),
            base_delay: Duration::from_millis(config.ready_interval_ms),
            max_delay: Duration::from_millis(config.ready_max_interval_ms),
            backoff_multiplier: 2.0,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay_ms = self.base_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay_ms = delay_ms.min(self.max_delay.as_millis() as f64) as u64;
        Duration::from_millis(delay_ms)
    }

    /// Worst-case total time spent sleeping
    pub fn total_budget(&self) -> Duration {
        (1..self.max_attempts).map(|a| self.delay_for(a)).sum()
    }
}

/// Outcome of `poll_until`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The probe reported ready on this attempt
    Ready { attempts: u32 },
    /// Every attempt was used up
    Exhausted { attempts: u32 },
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready { .. })
    }
}

/// Run `operation` until it succeeds, a non-retryable error occurs, or the
/// attempts run out. Returns the last error on failure.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("Operation succeeded on attempt {}", attempt);
                }
                return Ok(value);
            }
            Err(error) if attempt < max_attempts && is_retryable(&error) => {
                let delay = policy.delay_for(attempt);
                debug!(
                    "Attempt {} of {} failed ({}), retrying in {:?}",
                    attempt, max_attempts, error, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                warn!("Giving up after {} attempt(s): {}", attempt, error);
                return Err(error);
            }
        }
    }
}

/// Call `probe` until it returns `true` or the attempts run out. Probe
/// errors count as "not ready yet".
pub async fn poll_until<F, Fut, E>(policy: &RetryPolicy, mut probe: F) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::fmt::Display,
{
    let mut attempts = 0;
    let result = retry_with_backoff(
        policy,
        || {
            attempts += 1;
            let check = probe();
            async move {
                match check.await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err("not ready".to_string()),
                    Err(e) => Err(e.to_string()),
                }
            }
        },
        |_| true,
    )
    .await;

    match result {
        Ok(()) => PollOutcome::Ready { attempts },
        Err(_) => PollOutcome::Exhausted { attempts },
    }
}
