//! # Backoff policy for deferred re-attempts.
//!
//! [`BackoffPolicy`] controls how long the retry controller waits before
//! re-entering a failed component's load. It is parameterized by:
//! - [`BackoffPolicy::first`] the delay before the first retry;
//! - [`BackoffPolicy::growth`] how the delay grows with each further retry;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! For retry `n` (0-indexed) the base delay is `first × (n + 1)` with
//! [`Growth::Linear`] or `first × factor^n` with [`Growth::Exponential`],
//! clamped to `max`, then jitter is applied. The base delay is derived purely
//! from the retry index, so jitter output never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use initvisor::{BackoffPolicy, Growth, JitterPolicy};
//!
//! // Default: 1s, 2s, 3s ... before attempts 2, 3, 4 ...
//! let linear = BackoffPolicy::default();
//! assert_eq!(linear.next(0), Duration::from_secs(1));
//! assert_eq!(linear.next(2), Duration::from_secs(3));
//!
//! let exp = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     growth: Growth::Exponential { factor: 2.0 },
//!     jitter: JitterPolicy::None,
//! };
//! assert_eq!(exp.next(1), Duration::from_millis(200));
//! assert_eq!(exp.next(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// How the base delay grows with the retry index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Growth {
    /// `first × (retry + 1)`: 1s, 2s, 3s for `first = 1s`.
    Linear,
    /// `first × factor^retry` (`factor >= 1.0` recommended).
    Exponential {
        /// Multiplicative growth factor.
        factor: f64,
    },
}

/// Retry backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Growth curve.
    pub growth: Growth,
    /// Jitter policy to spread simultaneous retries.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `first = 1s`;
    /// - `growth = Linear`;
    /// - `max = 30s`;
    /// - `jitter = None`.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            growth: Growth::Linear,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Constant delay between retries (no growth, no jitter).
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            growth: Growth::Linear,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the delay before retry number `retry` (0-indexed).
    ///
    /// # Notes
    /// - Non-finite or negative intermediate values clamp to [`BackoffPolicy::max`].
    /// - `Decorrelated` jitter draws from `[min(first, max), 3 × base]`, capped at `max`.
    pub fn next(&self, retry: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let first_secs = self.first.as_secs_f64();

        let unclamped_secs = match self.growth {
            Growth::Linear => first_secs * (f64::from(retry) + 1.0),
            Growth::Exponential { factor } => {
                let exp = retry.min(i32::MAX as u32) as i32;
                first_secs * factor.powi(exp)
            }
        };

        let base =
            if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
                self.max
            } else {
                Duration::from_secs_f64(unclamped_secs)
            };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }
}
