//! Retry logic.
//!
//! # Responsibilities
//! - Re-run an operation while its outcome is classified as transient
//! - Sleep with exponential backoff between attempts
//! - Report every retry (attempt number, delay, cause) to logs and metrics
//!
//! # Design Decisions
//! - The policy knows nothing about HTTP; the caller classifies outcomes
//! - After the last retry the final outcome is returned as-is

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;

/// Why an attempt is considered worth retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryCause {
    /// Connection refused, reset, DNS failure, ...
    Network(String),
    /// The attempt exceeded its deadline.
    Timeout,
    /// The server answered with 408 or a 5xx status.
    Status(u16),
}

impl RetryCause {
    /// Low-cardinality label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RetryCause::Network(_) => "network",
            RetryCause::Timeout => "timeout",
            RetryCause::Status(_) => "status",
        }
    }
}

impl fmt::Display for RetryCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryCause::Network(e) => write!(f, "network error: {}", e),
            RetryCause::Timeout => write!(f, "timeout"),
            RetryCause::Status(s) => write!(f, "status {}", s),
        }
    }
}

/// Returns true for HTTP statuses that are worth retrying (408 and 5xx).
pub fn is_transient_status(status: u16) -> bool {
    status == 408 || (500..=599).contains(&status)
}

/// Retry policy with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64, jitter: bool) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
            jitter,
        }
    }

    /// Build the policy from configuration. Disabled retries mean a single attempt.
    pub fn from_config(config: &RetryConfig) -> Self {
        let max_retries = if config.enabled { config.max_retries } else { 0 };
        Self::new(max_retries, config.base_delay_ms, config.max_delay_ms, config.jitter)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        calculate_backoff(retry, self.base_delay_ms, self.max_delay_ms, self.jitter)
    }

    /// Run `op` until it yields a non-transient outcome or the retries run out.
    ///
    /// `op` receives the 1-based attempt number. `classify` returns the cause
    /// when an outcome should be retried.
    pub async fn run<T, F, Fut, C>(&self, mut op: F, classify: C) -> T
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = T>,
        C: Fn(&T) -> Option<RetryCause>,
    {
        let mut attempt = 1;
        loop {
            let outcome = op(attempt).await;

            let cause = match classify(&outcome) {
                Some(cause) => cause,
                None => return outcome,
            };

            if attempt > self.max_retries {
                tracing::warn!(
                    attempts = attempt,
                    cause = %cause,
                    "Retries exhausted"
                );
                return outcome;
            }

            let delay = self.delay_for(attempt);
            tracing::info!(
                attempt = attempt,
                max_retries = self.max_retries,
                delay = ?delay,
                cause = %cause,
                "Retrying request"
            );
            metrics::record_retry(cause.label());

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn classify_status(status: &u16) -> Option<RetryCause> {
        is_transient_status(*status).then(|| RetryCause::Status(*status))
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(408));
        assert!(is_transient_status(500));
        assert!(is_transient_status(503));
        assert!(!is_transient_status(400));
        assert!(!is_transient_status(401));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_four_attempts_with_doubling_delays() {
        let policy = RetryPolicy::default();
        let starts = Arc::new(Mutex::new(Vec::new()));
        let origin = Instant::now();

        let recorded = starts.clone();
        let result = policy
            .run(
                move |_| {
                    recorded.lock().unwrap().push(origin.elapsed());
                    async { 503u16 }
                },
                classify_status,
            )
            .await;

        assert_eq!(result, 503);
        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 4);
        let gaps: Vec<_> = starts.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_not_retried() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));

        let c = calls.clone();
        let result = policy
            .run(
                move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    async { 404u16 }
                },
                classify_status,
            )
            .await;

        assert_eq!(result, 404);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient() {
        let policy = RetryPolicy::default();

        let result = policy
            .run(
                |attempt| async move { if attempt < 3 { 500u16 } else { 200u16 } },
                classify_status,
            )
            .await;

        assert_eq!(result, 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_policy_single_attempt() {
        let config = RetryConfig {
            enabled: false,
            ..RetryConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        let calls = Arc::new(AtomicU32::new(0));

        let c = calls.clone();
        policy
            .run(
                move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    async { 502u16 }
                },
                classify_status,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
