//! # Retry controller: one component's load flow.
//!
//! Drives a component from its first attempt to a terminal outcome. Exactly one
//! flow per component runs at a time (see [`FlightTable`](super::flight::FlightTable)).
//!
//! ## Architecture
//! ```text
//! drive(desc)
//! loop {
//!   ├─► runtime cancelled?          → Cancelled
//!   ├─► attempt += 1, tracker.begin
//!   ├─► resolve closure (DFS)       → NotRegistered / CyclicDependency (never retried)
//!   ├─► load dependencies (concurrently, single-flight)
//!   │     └─ any failed             → DependencyFailed (final, dependency already settled)
//!   ├─► acquire permit ─► run_once() ─► release permit
//!   ├─► record attempt, publish ModuleLoaded / AttemptFailed
//!   └─► on retryable failure:
//!         ├─ budget left  → publish RetryScheduled, sleep(backoff.next(attempt - 1))
//!         └─ exhausted    → RetryLimitExceeded (+ CriticalFailure if critical)
//! }
//! settle: flight table, tracker, publish ModuleFailed
//! ```
//!
//! ## Rules
//! - Attempts of one component run **sequentially**
//! - The permit is held only around the loader call, never while waiting on dependencies
//! - Backoff sleep is cancellable by shutdown

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tokio::{select, time};

use crate::{
    components::ComponentDescriptor,
    core::{flight::Outcome, orchestrator::Orchestrator, runner::run_once},
    error::LoadError,
    events::{Event, EventKind},
    loaders::Export,
    status::{AttemptOutcome, AttemptRecord},
};

impl Orchestrator {
    /// Full load flow of one component.
    ///
    /// Returned as a boxed future: the flow loads dependencies through
    /// [`Orchestrator::load_component`], which in turn spawns `drive`.
    pub(super) fn drive(self: Arc<Self>, desc: Arc<ComponentDescriptor>) -> BoxFuture<'static, Outcome> {
        async move {
            let budget = desc
                .retry_budget()
                .unwrap_or_else(|| self.cfg.retry_budget_clamped())
                .max(1);
            let mut attempt: u32 = 0;

            let outcome = loop {
                if self.runtime_token.is_cancelled() {
                    break Err(LoadError::Cancelled {
                        component: desc.name().to_string(),
                    });
                }
                attempt += 1;

                let err = match self.attempt(&desc, attempt).await {
                    Ok(export) => break Ok(export),
                    Err(err) => err,
                };
                // A dependency only reports failure once it has settled terminally.
                if !err.is_retryable() || matches!(err, LoadError::DependencyFailed { .. }) {
                    break Err(err);
                }
                if attempt >= budget {
                    break Err(LoadError::RetryLimitExceeded {
                        component: desc.name().to_string(),
                        attempts: attempt,
                        last: err.to_string(),
                    });
                }

                let delay = self.cfg.backoff.next(attempt - 1);
                self.bus.publish(
                    Event::now(EventKind::RetryScheduled)
                        .with_component(desc.name())
                        .with_attempt(attempt)
                        .with_delay(delay)
                        .with_reason(err.to_string()),
                );

                let sleep = time::sleep(delay);
                tokio::pin!(sleep);
                select! {
                    _ = &mut sleep => {}
                    _ = self.runtime_token.cancelled() => {
                        break Err(LoadError::Cancelled {
                            component: desc.name().to_string(),
                        });
                    }
                }
            };

            self.settle(&desc, attempt, &outcome);
            outcome
        }
        .boxed()
    }

    /// One attempt: structure check, dependencies, loader. Always leaves one record.
    async fn attempt(self: &Arc<Self>, desc: &ComponentDescriptor, attempt: u32) -> Outcome {
        let started_at = SystemTime::now();
        let clock = time::Instant::now();
        self.tracker.begin(desc.name());

        let result = self.attempt_inner(desc, attempt).await;
        let duration = clock.elapsed();

        self.tracker.record(AttemptRecord {
            component: desc.name().to_string(),
            attempt,
            started_at,
            finished_at: started_at + duration,
            duration,
            outcome: match result {
                Ok(_) => AttemptOutcome::Loaded,
                Err(_) => AttemptOutcome::Failed,
            },
            error: result.as_ref().err().cloned(),
        });
        self.publish_attempt(desc.name(), attempt, duration, result.as_ref().err());
        result
    }

    async fn attempt_inner(self: &Arc<Self>, desc: &ComponentDescriptor, attempt: u32) -> Outcome {
        if let Err(err) = self.registry.resolve(desc.name()) {
            if let LoadError::NotRegistered { name } = &err {
                self.bus.publish(
                    Event::now(EventKind::ModuleNotFound)
                        .with_component(name.as_str())
                        .with_reason(format!("required by '{}'", desc.name())),
                );
            }
            return Err(err);
        }

        self.load_dependencies(desc).await?;

        let _permit = match &self.semaphore {
            Some(sem) => {
                let permit = sem.clone().acquire_owned();
                select! {
                    res = permit => match res {
                        Ok(permit) => Some(permit),
                        Err(_closed) => return Err(LoadError::Cancelled { component: desc.name().to_string() }),
                    },
                    _ = self.runtime_token.cancelled() => {
                        return Err(LoadError::Cancelled { component: desc.name().to_string() });
                    }
                }
            }
            None => None,
        };

        run_once(
            desc.loader().as_ref(),
            desc.name(),
            &self.runtime_token,
            self.timeout_for(desc),
            attempt,
            &self.bus,
        )
        .await
    }

    /// Loads every dependency concurrently; the first failure (in declaration order) wins.
    async fn load_dependencies(self: &Arc<Self>, desc: &ComponentDescriptor) -> Result<Vec<Export>, LoadError> {
        let deps = desc.dependencies();
        if deps.is_empty() {
            return Ok(Vec::new());
        }

        let results = join_all(deps.iter().map(|dep| self.load_component(dep))).await;
        deps.iter()
            .zip(results)
            .map(|(dep, res)| {
                res.map_err(|err| match err {
                    LoadError::Cancelled { .. } => LoadError::Cancelled {
                        component: desc.name().to_string(),
                    },
                    other => LoadError::DependencyFailed {
                        component: desc.name().to_string(),
                        dependency: dep.clone(),
                        reason: other.to_string(),
                    },
                })
            })
            .collect()
    }

    fn timeout_for(&self, desc: &ComponentDescriptor) -> Option<Duration> {
        match desc.timeout() {
            Some(d) if d.is_zero() => None,
            Some(d) => Some(d),
            None => self.cfg.default_timeout(),
        }
    }

    fn publish_attempt(&self, name: &str, attempt: u32, duration: Duration, err: Option<&LoadError>) {
        let ev = match err {
            None => Event::now(EventKind::ModuleLoaded),
            Some(err) => Event::now(EventKind::AttemptFailed).with_reason(err.to_string()),
        };
        self.bus.publish(
            ev.with_component(name)
                .with_attempt(attempt)
                .with_duration(duration),
        );
    }

    /// Stores the final outcome and announces terminal failures.
    fn settle(&self, desc: &ComponentDescriptor, attempts: u32, outcome: &Outcome) {
        self.flights.settle(desc.name(), outcome);

        let Err(err) = outcome else {
            return;
        };
        self.tracker.settle_failed(desc.name(), err);
        self.bus.publish(
            Event::now(EventKind::ModuleFailed)
                .with_component(desc.name())
                .with_attempt(attempts)
                .with_reason(err.to_string()),
        );

        if desc.is_critical() && !matches!(err, LoadError::Cancelled { .. }) {
            self.bus.publish(
                Event::now(EventKind::CriticalFailure)
                    .with_component(desc.name())
                    .with_reason(err.to_string()),
            );
        }
    }
}
