//! Retry delay computation.
//!
//! The policy is a visible pure function rather than decorator-style
//! wrapping: `delay(attempt) = min(max, min * multiplier^(attempt-1))`.

use std::time::Duration;

/// Delay to sleep after the given 1-based failed attempt.
pub fn retry_delay(attempt: u32, min: Duration, max: Duration, multiplier: f64) -> Duration {
    let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
    let millis = (min.as_millis() as f64 * factor).round();
    let capped = millis.min(max.as_millis() as f64).max(0.0);
    Duration::from_millis(capped as u64)
}
