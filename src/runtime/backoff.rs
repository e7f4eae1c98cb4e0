//! Restart backoff for failed event sources.
//!
//! A source that returns an error is restarted by the supervisor after an
//! exponentially growing delay with full jitter, so a persistently broken
//! FIFO does not turn into a hot restart loop.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with full jitter.
///
/// The base delay for attempt `n` (1-based) is `first * factor^(n-1)`,
/// clamped to `max`. With jitter enabled the actual delay is drawn uniformly
/// from `[0, base]`.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Delay before the first restart.
    pub first: Duration,
    /// Upper bound on the computed delay.
    pub max: Duration,
    /// Multiplier applied per attempt.
    pub factor: f64,
    /// Draw the delay uniformly from `[0, base]` instead of using it as-is.
    pub jitter: bool,
}

impl RetryPolicy {
    /// Computes the delay before restart attempt `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if !self.jitter || base.is_zero() {
            return base;
        }
        let upper = base.as_secs_f64();
        Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..=upper))
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let scaled = self.first.as_secs_f64() * self.factor.powi(exp.min(i32::MAX as u32) as i32);
        if !scaled.is_finite() {
            return self.max;
        }
        // Clamp in float space; from_secs_f64 panics on out-of-range input.
        let capped = scaled.clamp(0.0, self.max.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}

impl Default for RetryPolicy {
    /// `first = 500ms`, `max = 30s`, `factor = 2.0`, jitter on.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(500),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: true,
        }
    }
}
