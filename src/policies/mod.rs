//! Retry delay policies.
//!
//! This module groups the knobs that control **how long** the retry controller
//! waits before re-entering a failed component's load.
//!
//! ## Contents
//! - [`BackoffPolicy`] how retry delays evolve (first / growth / max + jitter)
//! - [`Growth`]        linear or exponential curve
//! - [`JitterPolicy`]  randomization strategy to avoid lockstep retries
//!
//! ## Quick wiring
//! ```text
//! Config { retry_budget, backoff: BackoffPolicy, .. }
//!      └─► core::retry uses:
//!           - retry_budget (or the component's override) to decide retry/give up
//!           - backoff.next(retry) to schedule the deferred re-attempt
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=1s, growth=Linear, max=30s, jitter=None,
//!   i.e. 1s, 2s, 3s before attempts 2, 3, 4.

mod backoff;
mod jitter;

pub use backoff::{BackoffPolicy, Growth};
pub use jitter::JitterPolicy;
