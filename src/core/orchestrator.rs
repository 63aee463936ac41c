//! # Orchestrator: registers components and loads them in dependency order.
//!
//! The [`Orchestrator`] owns the registry, the event bus, the single-flight table
//! and the status tracker. Every entry point funnels into [`Orchestrator::load_component`].
//!
//! ## High-level architecture
//! ```text
//! register(name, loader, opts) ──► Registry (sealed on first load)
//!
//! load_all():
//!   priority_groups() ─► [p0: a, b] ─► barrier ─► [p10: c] ─► barrier ─► ...
//!                           │  │                     │
//!                           ▼  ▼                     ▼
//!                     load_component(name) ─► FlightTable::join_or_start
//!                                               ├─ settled  → stored outcome
//!                                               ├─ running  → await shared flow
//!                                               └─ vacant   → spawn drive(desc)
//!                                                               └─► deps first, then loader
//!
//! Event flow:
//!   drive / load_all ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!
//! Shutdown path:
//!   shutdown() ─► runtime_token.cancel() ─► flows stop at their next safe point
//!              └► TaskTracker::wait()    ─► subscriber queues drained
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use initvisor::{ComponentOptions, Config, LoaderError, LoaderFn, Orchestrator};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::new(Config::default());
//!
//!     orch.register(
//!         "config",
//!         LoaderFn::arc(|_ctx: CancellationToken| async { Ok::<_, LoaderError>(42u32) }),
//!         ComponentOptions::new().priority(0).critical(true),
//!     )?;
//!     orch.register(
//!         "server",
//!         LoaderFn::arc(|_ctx: CancellationToken| async { Ok::<_, LoaderError>("up") }),
//!         ComponentOptions::new().priority(10).depends_on(["config"]),
//!     )?;
//!
//!     let report = orch.load_all().await?;
//!     assert_eq!(report.loaded, 2);
//!     assert_eq!(orch.export::<u32>("config").as_deref(), Some(&42));
//!
//!     orch.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::join_all;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::{
    components::{ComponentDescriptor, ComponentOptions},
    core::{
        Config,
        flight::{FlightTable, Joined, SharedOutcome},
        registry::Registry,
        tracker::StatusTracker,
    },
    error::{LoadError, RuntimeError},
    events::{Bus, Event, EventKind},
    loaders::{Export, LoaderRef},
    status::{ModuleStatus, RunReport, Statistics},
    subscribers::SubscriberSet,
};

/// Coordinates component registration, dependency-ordered loading and reporting.
pub struct Orchestrator {
    pub(super) cfg: Config,
    pub(super) bus: Bus,
    pub(super) registry: Registry,
    pub(super) flights: FlightTable,
    pub(super) tracker: StatusTracker,
    pub(super) semaphore: Option<Arc<Semaphore>>,
    pub(super) runtime_token: CancellationToken,
    tasks: TaskTracker,
    fanout: Mutex<Option<Fanout>>,
}

/// Subscriber delivery owned by the orchestrator until shutdown.
pub(super) struct Fanout {
    pub(super) subs: Arc<SubscriberSet>,
    pub(super) listener: JoinHandle<()>,
}

impl Orchestrator {
    pub(super) fn new_internal(
        cfg: Config,
        bus: Bus,
        registry: Registry,
        runtime_token: CancellationToken,
        fanout: Option<Fanout>,
    ) -> Self {
        let semaphore = cfg.concurrency_limit().map(Semaphore::new).map(Arc::new);
        Self {
            cfg,
            bus,
            registry,
            flights: FlightTable::new(),
            tracker: StatusTracker::new(),
            semaphore,
            runtime_token,
            tasks: TaskTracker::new(),
            fanout: Mutex::new(fanout),
        }
    }

    /// Creates an orchestrator without subscribers or profiles.
    ///
    /// Shorthand for `Orchestrator::builder(cfg).build()`.
    pub fn new(cfg: Config) -> Arc<Self> {
        Self::builder(cfg).build()
    }

    /// Starts building an orchestrator.
    pub fn builder(cfg: Config) -> super::OrchestratorBuilder {
        super::OrchestratorBuilder::new(cfg)
    }

    /// Registers (or replaces) a component.
    ///
    /// Options are layered `defaults ← profile ← opts`. Fails with
    /// [`RuntimeError::RegistrySealed`] once any load has started.
    pub fn register(
        &self,
        name: impl Into<String>,
        loader: LoaderRef,
        opts: ComponentOptions,
    ) -> Result<(), RuntimeError> {
        self.registry.register(name.into(), loader, opts)
    }

    /// Loads every non-lazy component, one priority group at a time.
    ///
    /// A group starts only after every member of the previous group reached a
    /// terminal outcome. Non-critical failures are recorded and the pass continues;
    /// a critical failure aborts the pass after its group settles.
    pub async fn load_all(self: &Arc<Self>) -> Result<RunReport, RuntimeError> {
        self.registry.seal();
        let run_clock = Instant::now();

        for (priority, members) in self.registry.priority_groups() {
            if self.runtime_token.is_cancelled() {
                return Err(RuntimeError::Cancelled);
            }
            let group_clock = Instant::now();
            self.bus.publish(
                Event::now(EventKind::GroupStarting)
                    .with_priority(priority)
                    .with_count(members.len()),
            );

            let outcomes = join_all(members.iter().map(|d| self.load_component(d.name()))).await;
            let failed = outcomes.iter().filter(|o| o.is_err()).count();
            self.bus.publish(
                Event::now(EventKind::GroupCompleted)
                    .with_priority(priority)
                    .with_totals(members.len() - failed, failed)
                    .with_duration(group_clock.elapsed()),
            );

            let fatal = members
                .iter()
                .zip(outcomes)
                .find_map(|(desc, outcome)| match outcome {
                    Err(err) if desc.is_critical() => Some((desc, err)),
                    _ => None,
                });
            if let Some((desc, err)) = fatal {
                self.bus.publish(
                    Event::now(EventKind::RunAborted)
                        .with_component(desc.name())
                        .with_priority(priority)
                        .with_reason(err.to_string()),
                );
                return Err(RuntimeError::CriticalFailure {
                    component: desc.name().to_string(),
                    source: err,
                });
            }
        }

        let report = self.export_loading_report();
        self.bus.publish(
            Event::now(EventKind::LoadingComplete)
                .with_totals(report.loaded, report.failed)
                .with_duration(run_clock.elapsed()),
        );
        Ok(report)
    }

    /// Loads one component and, first, its whole dependency closure.
    ///
    /// Concurrent callers for the same name share a single flow. A settled
    /// component returns its stored outcome; a terminally failed one is never
    /// re-attempted.
    pub async fn load_component(self: &Arc<Self>, name: &str) -> Result<Export, LoadError> {
        self.registry.seal();
        let Some(desc) = self.registry.get(name) else {
            self.bus
                .publish(Event::now(EventKind::ModuleNotFound).with_component(name));
            return Err(LoadError::NotRegistered {
                name: name.to_string(),
            });
        };

        match self.flights.join_or_start(name, || self.start_flight(desc)) {
            Joined::Ready(outcome) => outcome,
            Joined::Wait(flow) => flow.await,
        }
    }

    /// Loads a component on demand, typically one registered as lazy.
    pub async fn load_lazy(self: &Arc<Self>, name: &str) -> Result<Export, LoadError> {
        tracing::debug!(component = name, "on-demand load requested");
        self.load_component(name).await
    }

    /// Typed access to a loaded component's export.
    ///
    /// `None` if the component is not loaded or exports a different type.
    pub fn export<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.flights.export(name)?.downcast::<T>().ok()
    }

    /// Current status of a component; `None` if it was never registered.
    pub fn module_status(&self, name: &str) -> Option<ModuleStatus> {
        self.tracker.status(name).or_else(|| {
            self.registry
                .contains(name)
                .then(|| ModuleStatus::registered(name))
        })
    }

    /// Report of every attempt made so far.
    pub fn export_loading_report(&self) -> RunReport {
        self.tracker.report()
    }

    /// Extended statistics over every attempt made so far.
    pub fn advanced_statistics(&self) -> Statistics {
        self.tracker.statistics()
    }

    /// Registered components ordered by priority, then registration order.
    pub fn configured_components(&self) -> Vec<ComponentDescriptor> {
        self.registry.snapshot()
    }

    /// Transitive dependencies of `name`, each after its own dependencies.
    ///
    /// Runs no loaders; reports `NotRegistered` or `CyclicDependency` as loading would.
    pub fn dependency_order(&self, name: &str) -> Result<Vec<String>, LoadError> {
        self.registry.resolve(name)
    }

    /// True once the first load started.
    pub fn is_sealed(&self) -> bool {
        self.registry.is_sealed()
    }

    /// Subscribes to the raw event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Cancels running flows, waits for them to stop and drains subscriber queues.
    ///
    /// Idempotent. Loads started afterwards end with [`LoadError::Cancelled`].
    pub async fn shutdown(&self) {
        self.runtime_token.cancel();
        self.tasks.close();
        self.tasks.wait().await;

        let fanout = self
            .fanout
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(Fanout { subs, listener }) = fanout {
            let _ = listener.await;
            match Arc::try_unwrap(subs) {
                Ok(set) => set.shutdown().await,
                Err(_) => tracing::debug!("subscriber set still shared; skipping drain"),
            }
        }
    }

    fn start_flight(self: &Arc<Self>, desc: Arc<ComponentDescriptor>) -> SharedOutcome {
        let component = desc.name().to_string();
        let handle = self.tasks.spawn(Arc::clone(self).drive(desc));
        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    tracing::warn!(component = %component, error = %join_err, "load flow aborted");
                    Err(LoadError::Cancelled { component })
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}
