//! # initvisor
//!
//! **Initvisor** is a module initialization orchestrator for async Rust.
//!
//! Applications register named components, each with an async loader, a
//! priority, a critical flag, an optional lazy flag and a list of dependencies.
//! The orchestrator loads them in dependency order, one priority group at a
//! time, retries transient failures with backoff, and keeps a record of every
//! attempt for reporting.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   register(name, loader, ComponentOptions)      (profiles layered in between)
//!            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                     │
//! │  - Registry       (descriptors, sealed on first load)             │
//! │  - FlightTable    (one load flow per component)                   │
//! │  - StatusTracker  (attempt records, per-component status)         │
//! │  - Bus            (broadcast events)                              │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   load_all()        load_component()     load_lazy()
//!   (priority groups,        │
//!    barrier between)        ▼
//!               ┌─────────────────────────────────┐
//!               │ retry controller (per component)│
//!               │  resolve closure (DFS)          │
//!               │  load dependencies              │
//!               │  run_once(loader, timeout)      │
//!               │  backoff 1s, 2s, 3s ...         │
//!               └───────────────┬─────────────────┘
//!                               ▼ publish
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                          subscriber_listener
//!                                   ▼
//!                             SubscriberSet
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                     worker1    worker2    workerN
//! ```
//!
//! ### Component lifecycle
//! ```text
//! Registered ──► Loading ──► Loaded
//!                   │
//!                   └──► Failed ──(retryable, budget left, after delay)──► Loading
//!                          │
//!                          └──(structural or exhausted)──► Failed (terminal)
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Orchestration** | Register, resolve and load components in order.                 | [`Orchestrator`], [`OrchestratorBuilder`]   |
//! | **Loaders**       | Async, cancelable loaders returning any shareable value.        | [`Loader`], [`LoaderFn`], [`LoaderRef`]     |
//! | **Components**    | Layered registration options.                                   | [`ComponentOptions`], [`ComponentDescriptor`] |
//! | **Policies**      | Retry delay curves and jitter.                                  | [`BackoffPolicy`], [`JitterPolicy`]         |
//! | **Status**        | Per-attempt records, run reports and statistics.                | [`ModuleStatus`], [`RunReport`], [`Statistics`] |
//! | **Subscriber API**| Hook into lifecycle events.                                     | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors for loaders, loads and the runtime.                | [`LoaderError`], [`LoadError`], [`RuntimeError`] |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber, which
//!   renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use initvisor::{ComponentOptions, Config, LoaderError, LoaderFn, Orchestrator};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.timeout = Duration::from_secs(5);
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn initvisor::Subscribe>> = vec![Arc::new(initvisor::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn initvisor::Subscribe>> = Vec::new();
//!
//!     let orch = Orchestrator::builder(cfg)
//!         .with_subscribers(subs)
//!         .with_profile("database", ComponentOptions::new().critical(true))
//!         .build();
//!
//!     orch.register(
//!         "database",
//!         LoaderFn::arc(|_ctx: CancellationToken| async { Ok::<_, LoaderError>("pool") }),
//!         ComponentOptions::new().priority(0),
//!     )?;
//!     orch.register(
//!         "search",
//!         LoaderFn::arc(|_ctx: CancellationToken| async { Ok::<_, LoaderError>(()) }),
//!         ComponentOptions::new().lazy(true).depends_on(["database"]),
//!     )?;
//!
//!     let report = orch.load_all().await?;
//!     assert_eq!(report.loaded, 1);
//!
//!     orch.load_lazy("search").await?;
//!     orch.shutdown().await;
//!     Ok(())
//! }
//! ```

mod components;
mod core;
mod error;
mod events;
mod loaders;
mod policies;
mod status;
mod subscribers;

// ---- Public re-exports ----

pub use components::{ComponentDescriptor, ComponentOptions, DEFAULT_PRIORITY};
pub use crate::core::{Config, Orchestrator, OrchestratorBuilder};
pub use error::{LoadError, LoaderError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use loaders::{Export, Loader, LoaderFn, LoaderRef};
pub use policies::{BackoffPolicy, Growth, JitterPolicy};
pub use status::{
    AttemptOutcome, AttemptRecord, ComponentTiming, LoadState, ModuleStatus, RunReport,
    Statistics,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
