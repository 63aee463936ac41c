//! # Jitter policy for retry delays.
//!
//! [`JitterPolicy`] randomizes backoff delays so that components failing
//! together (e.g. all members of one priority group losing the same backend)
//! do not re-attempt in lockstep.
//!
//! - [`JitterPolicy::None`] - exact delays
//! - [`JitterPolicy::Full`] - random in `[0, delay]`
//! - [`JitterPolicy::Equal`] - `delay/2 + random[0, delay/2]`
//! - [`JitterPolicy::Decorrelated`] - random in `[floor, 3 × delay]`, capped

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of retry delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use the exact backoff delay.
    #[default]
    None,
    /// Random delay in `[0, delay]`.
    Full,
    /// `delay/2 + random[0, delay/2]`; keeps roughly 75% of the delay on average.
    Equal,
    /// Random delay in `[floor, delay × 3]`, capped at the policy max.
    ///
    /// Needs context, see [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    ///
    /// `Decorrelated` returns the input unchanged here; it needs
    /// [`apply_decorrelated`](Self::apply_decorrelated).
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => delay,
            JitterPolicy::Full => full_jitter(delay),
            JitterPolicy::Equal => equal_jitter(delay),
        }
    }

    /// Applies decorrelated jitter around `delay`, never below `floor` nor above `max`.
    ///
    /// Falls back to [`apply`](Self::apply) for other variants.
    pub fn apply_decorrelated(&self, floor: Duration, delay: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(delay);
        }

        let floor_ms = millis(floor);
        let upper = millis(delay).saturating_mul(3).min(millis(max)).max(floor_ms);
        if floor_ms >= upper {
            return floor;
        }
        Duration::from_millis(rand::rng().random_range(floor_ms..=upper))
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn full_jitter(delay: Duration) -> Duration {
    let ms = millis(delay);
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

fn equal_jitter(delay: Duration) -> Duration {
    let half = millis(delay) / 2;
    if half == 0 {
        return delay;
    }
    Duration::from_millis(half + rand::rng().random_range(0..=half))
}
