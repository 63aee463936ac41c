//! # Component registry.
//!
//! Holds the resolved [`ComponentDescriptor`] of every registered component.
//! Writable until the first load starts, then sealed: a run never mutates it.
//!
//! ## Layering
//! ```text
//! register(name, loader, call_opts)
//!   └─► defaults ◄─ profiles[name] ◄─ call_opts   (later wins, field by field)
//!         └─► ComponentDescriptor::resolve(..)  ─► components[name] (replace)
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::components::{ComponentDescriptor, ComponentOptions};
use crate::core::resolver::{self, DependencyGraph};
use crate::error::{LoadError, RuntimeError};
use crate::loaders::LoaderRef;

type Components = HashMap<String, Arc<ComponentDescriptor>>;

#[derive(Default)]
struct Inner {
    components: Components,
    sealed: bool,
    next_seq: u64,
}

/// Write-once-then-sealed table of component descriptors.
pub(crate) struct Registry {
    inner: RwLock<Inner>,
    profiles: HashMap<String, ComponentOptions>,
}

impl Registry {
    pub(crate) fn new(profiles: HashMap<String, ComponentOptions>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            profiles,
        }
    }

    /// Inserts or replaces the descriptor for `name`.
    pub(crate) fn register(
        &self,
        name: String,
        loader: LoaderRef,
        opts: ComponentOptions,
    ) -> Result<(), RuntimeError> {
        let layered = match self.profiles.get(&name) {
            Some(profile) => profile.clone().overlay(&opts),
            None => opts,
        };

        let mut inner = self.write();
        if inner.sealed {
            return Err(RuntimeError::RegistrySealed { name });
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;

        let desc = ComponentDescriptor::resolve(name.clone(), loader, layered, seq);
        if inner.components.insert(name.clone(), Arc::new(desc)).is_some() {
            tracing::debug!(component = %name, "registration replaced");
        }
        Ok(())
    }

    /// Forbids further registration. Idempotent.
    pub(crate) fn seal(&self) {
        let mut inner = self.write();
        if !inner.sealed {
            inner.sealed = true;
            tracing::debug!(components = inner.components.len(), "registry sealed");
        }
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.read().sealed
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<ComponentDescriptor>> {
        self.read().components.get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.read().components.contains_key(name)
    }

    /// Copies of all descriptors ordered by priority, then registration order.
    pub(crate) fn snapshot(&self) -> Vec<ComponentDescriptor> {
        let inner = self.read();
        let mut all: Vec<ComponentDescriptor> =
            inner.components.values().map(|d| (**d).clone()).collect();
        all.sort_by_key(|d| (d.priority(), d.seq()));
        all
    }

    /// Non-lazy components grouped by ascending priority.
    pub(crate) fn priority_groups(&self) -> Vec<(i32, Vec<Arc<ComponentDescriptor>>)> {
        let inner = self.read();
        let mut groups: BTreeMap<i32, Vec<Arc<ComponentDescriptor>>> = BTreeMap::new();
        for desc in inner.components.values().filter(|d| !d.is_lazy()) {
            groups.entry(desc.priority()).or_default().push(Arc::clone(desc));
        }
        groups
            .into_iter()
            .map(|(priority, mut members)| {
                members.sort_by_key(|d| d.seq());
                (priority, members)
            })
            .collect()
    }

    /// Dependency closure of `name`, dependencies first.
    pub(crate) fn resolve(&self, name: &str) -> Result<Vec<String>, LoadError> {
        let inner = self.read();
        resolver::resolve(&inner.components, name)
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DependencyGraph for Components {
    fn dependencies(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(|d| d.dependencies())
    }
}
