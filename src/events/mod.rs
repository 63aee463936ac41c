//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted while components load.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `core::retry` (per component), `core::runner` (per attempt),
//!   `Orchestrator::load_all` (groups/run), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the orchestrator's subscriber listener (fans out to
//!   `SubscriberSet`) and any receiver from `Orchestrator::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
