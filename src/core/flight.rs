//! # Single-flight table.
//!
//! At most one load flow per component exists at any time. The first caller
//! starts the flow and stores a shared handle to it; everyone arriving while
//! it runs awaits that same handle. Once the flow settles, its outcome is kept
//! and returned to later callers without re-running anything.
//!
//! ```text
//! join_or_start(name)
//!   ├─ Loaded(export)  → Ready(Ok(export))
//!   ├─ Failed(err)     → Ready(Err(err))        (terminal, never re-attempted)
//!   ├─ Loading(shared) → Wait(shared.clone())
//!   └─ vacant          → start() → Loading(shared) → Wait(shared)
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, Shared};

use crate::error::LoadError;
use crate::loaders::Export;

/// Final result of one component's load flow.
pub(crate) type Outcome = Result<Export, LoadError>;

/// Cloneable handle to an in-flight load.
pub(crate) type SharedOutcome = Shared<BoxFuture<'static, Outcome>>;

enum Slot {
    Loading(SharedOutcome),
    Loaded(Export),
    Failed(LoadError),
}

/// What a caller gets back from [`FlightTable::join_or_start`].
pub(crate) enum Joined {
    Ready(Outcome),
    Wait(SharedOutcome),
}

#[derive(Default)]
pub(crate) struct FlightTable {
    slots: Mutex<HashMap<String, Slot>>,
}

impl FlightTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the settled outcome, joins the running flow, or starts a new one.
    ///
    /// `start` runs under the table lock; it must only spawn, never await.
    pub(crate) fn join_or_start<F>(&self, name: &str, start: F) -> Joined
    where
        F: FnOnce() -> SharedOutcome,
    {
        let mut slots = self.lock();
        match slots.get(name) {
            Some(Slot::Loaded(export)) => Joined::Ready(Ok(export.clone())),
            Some(Slot::Failed(err)) => Joined::Ready(Err(err.clone())),
            Some(Slot::Loading(shared)) => Joined::Wait(shared.clone()),
            None => {
                let shared = start();
                slots.insert(name.to_string(), Slot::Loading(shared.clone()));
                Joined::Wait(shared)
            }
        }
    }

    /// Replaces the in-flight slot with the final outcome.
    pub(crate) fn settle(&self, name: &str, outcome: &Outcome) {
        let slot = match outcome {
            Ok(export) => Slot::Loaded(export.clone()),
            Err(err) => Slot::Failed(err.clone()),
        };
        self.lock().insert(name.to_string(), slot);
    }

    /// Export of a loaded component.
    pub(crate) fn export(&self, name: &str) -> Option<Export> {
        match self.lock().get(name) {
            Some(Slot::Loaded(export)) => Some(export.clone()),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
