//! # Global runtime configuration.
//!
//! Provides [`Config`], centralized settings for the orchestrator.
//!
//! Config is used in two ways:
//! 1. **Orchestrator creation**: `Orchestrator::builder(config)`
//! 2. **Component defaults**: retry budget and timeout apply unless a
//!    component's options override them.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no semaphore created)
//! - `timeout = 0s` → no timeout
//! - `retry_budget = 0` → treated as 1 (every component gets one attempt)

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Global configuration for the orchestrator.
///
/// ## Field semantics
/// - `retry_budget`: total attempts per component, including the first
/// - `backoff`: delay before each deferred re-attempt
/// - `timeout`: per-attempt loader timeout (`0s` = none)
/// - `max_concurrent`: simultaneous loader invocations (`0` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1)
///
/// # Example
/// ```
/// use std::time::Duration;
/// use initvisor::Config;
///
/// let mut cfg = Config::default();
/// cfg.retry_budget = 5;
/// cfg.timeout = Duration::ZERO;
///
/// assert_eq!(cfg.default_timeout(), None);
/// assert_eq!(cfg.concurrency_limit(), None);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Total attempts per component, including the first.
    pub retry_budget: u32,

    /// Delay policy for deferred re-attempts.
    pub backoff: BackoffPolicy,

    /// Default per-attempt timeout.
    ///
    /// A loader that does not finish in time has its token cancelled and the
    /// attempt fails as `LoaderThrew`.
    pub timeout: Duration,

    /// Maximum number of loaders running at once.
    ///
    /// Permits are held only while a loader runs, never while a component
    /// waits on its dependencies.
    pub max_concurrent: usize,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the global concurrency limit as an `Option`.
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the default per-attempt timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns the retry budget clamped to a minimum of 1.
    #[inline]
    pub fn retry_budget_clamped(&self) -> u32 {
        self.retry_budget.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `retry_budget = 3`
    /// - `backoff = BackoffPolicy::default()` (1s, 2s, 3s ...)
    /// - `timeout = 30s`
    /// - `max_concurrent = 0` (unlimited)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            retry_budget: 3,
            backoff: BackoffPolicy::default(),
            timeout: Duration::from_secs(30),
            max_concurrent: 0,
            bus_capacity: 1024,
        }
    }
}
