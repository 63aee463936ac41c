//! # Event subscribers for the initvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`] (feature `logging`).
//!
//! ## Architecture
//! ```text
//! retry controller / runner / load_all ── publish(Event) ──► Bus
//!                                                             │
//!                                               subscriber listener
//!                                                             │
//!                                                   SubscriberSet::emit
//!                                             ┌───────────────┼───────────────┐
//!                                             ▼               ▼               ▼
//!                                         LogWriter     diagnostics UI      custom
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;

pub(crate) use set::panic_message;
