//! Exponential backoff with optional jitter.

use rand::Rng;
use std::time::Duration;

/// Calculate the delay before retry number `attempt` (1-based).
///
/// The delay is `base_ms * 2^(attempt - 1)` capped at `max_ms`, so with a
/// one second base the sequence is 1s, 2s, 4s, ...
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64, jitter: bool) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    if !jitter {
        return Duration::from_millis(capped_delay);
    }

    // Up to 10% extra; never enough to reach the next uncapped step.
    let jitter_range = capped_delay / 10;
    let extra = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + extra)
}
