use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;

use crate::{
    components::ComponentOptions,
    core::Config,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

use super::{
    orchestrator::{Fanout, Orchestrator},
    registry::Registry,
};

/// Builder for constructing an [`Orchestrator`] with optional features.
pub struct OrchestratorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    profiles: HashMap<String, ComponentOptions>,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            profiles: HashMap::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (component lifecycle, group barriers, etc.)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a configuration profile for one component.
    ///
    /// Profile values override built-in defaults and are overridden by the
    /// options passed to `register`.
    pub fn with_profile(mut self, name: impl Into<String>, profile: ComponentOptions) -> Self {
        self.profiles.insert(name.into(), profile);
        self
    }

    /// Builds and returns the orchestrator.
    ///
    /// Must be called inside a tokio runtime when subscribers are configured.
    pub fn build(self) -> Arc<Orchestrator> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();

        let fanout = (!self.subscribers.is_empty()).then(|| {
            let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
            let listener = subscriber_listener(&bus, Arc::clone(&subs), runtime_token.clone());
            Fanout { subs, listener }
        });

        Arc::new(Orchestrator::new_internal(
            self.cfg,
            bus,
            Registry::new(self.profiles),
            runtime_token,
            fanout,
        ))
    }
}

/// Forwards bus events to the subscriber set until the runtime token is cancelled,
/// then forwards whatever is still buffered.
fn subscriber_listener(
    bus: &Bus,
    set: Arc<SubscriberSet>,
    token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => return,
                },
                _ = token.cancelled() => break,
            }
        }
        loop {
            match rx.try_recv() {
                Ok(ev) => set.emit(&ev),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    })
}
