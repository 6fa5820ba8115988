//! Transport-layer retry, the sole resilience mechanism the engine imposes
//! (§5 "Cancellation and timeouts", §7: "Retries happen only at the HTTP
//! transport layer, bounded by `max_retries`").
//!
//! Grounded on a conventional resilience-module retry loop and retryable-
//! error classification, trimmed to the single knob exposed here
//! (`max_retries`); backoff shape (initial delay, multiplier, cap) is fixed
//! to sane literals rather than exposed as new `Config` keys, since §6 does
//! not name a backoff schedule as part of the external configuration surface.

use std::time::Duration;
use tokio::time::sleep;

const INITIAL_DELAY_MS: u64 = 100;
const MAX_DELAY_MS: u64 = 2_000;
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Determines if an error is worth retrying: connection and timeout failures,
/// plus 408/429 and 5xx responses other than 501/505.
#[must_use]
pub fn is_retryable(error: &reqwest::Error) -> bool {
    if error.is_connect() || error.is_timeout() {
        return true;
    }
    error
        .status()
        .is_none_or(|status| is_retryable_status(status.as_u16()))
}

#[must_use]
pub const fn is_retryable_status(status: u16) -> bool {
    match status {
        408 | 429 => true,
        500..=599 => !matches!(status, 501 | 505),
        _ => false,
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(16);
    let delay_ms =
        (INITIAL_DELAY_MS as f64 * BACKOFF_MULTIPLIER.powi(capped_attempt as i32)).min(MAX_DELAY_MS as f64);
    Duration::from_millis(delay_ms as u64)
}

/// Runs `operation` up to `max_retries + 1` times, retrying only on
/// `is_retryable` failures, with exponential backoff between attempts.
///
/// # Errors
/// Returns the last error if every attempt fails.
pub async fn with_retry<F, Fut, T>(max_retries: u32, mut operation: F) -> Result<T, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries && is_retryable(&err) => {
                sleep(backoff_delay(attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
