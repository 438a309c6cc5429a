//! Timeout enforcement.
//!
//! Every transport attempt runs under a deadline. An elapsed deadline is its
//! own error so the retry policy can treat it as transient.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// The wrapped operation did not finish in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// Run `fut` with a deadline of `limit`.
pub async fn with_timeout<F>(limit: Duration, fut: F) -> Result<F::Output, TimedOut>
where
    F: Future,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| TimedOut(limit))
}
