//! # Component descriptor.
//!
//! [`ComponentDescriptor`] is the fully resolved registration of one component:
//! its loader plus the scheduling attributes the orchestrator reads. Descriptors
//! are immutable once registered; `configured_components()` hands out clones.

use std::fmt;
use std::time::Duration;

use crate::components::ComponentOptions;
use crate::loaders::LoaderRef;

/// Built-in priority when no layer sets one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Fully resolved registration of one component.
#[derive(Clone)]
pub struct ComponentDescriptor {
    name: String,
    loader: LoaderRef,
    priority: i32,
    critical: bool,
    lazy: bool,
    dependencies: Vec<String>,
    retry_budget: Option<u32>,
    timeout: Option<Duration>,
    seq: u64,
}

impl ComponentDescriptor {
    /// Resolves a descriptor from already-merged options.
    ///
    /// Dependencies are de-duplicated, keeping first occurrence order.
    pub(crate) fn resolve(
        name: String,
        loader: LoaderRef,
        opts: ComponentOptions,
        seq: u64,
    ) -> Self {
        let mut dependencies: Vec<String> = Vec::new();
        for dep in opts.dependencies.unwrap_or_default() {
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }

        Self {
            name,
            loader,
            priority: opts.priority.unwrap_or(DEFAULT_PRIORITY),
            critical: opts.critical.unwrap_or(false),
            lazy: opts.lazy.unwrap_or(false),
            dependencies,
            retry_budget: opts.retry_budget,
            timeout: opts.timeout,
            seq,
        }
    }

    /// Unique component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loader invoked for each attempt.
    pub fn loader(&self) -> &LoaderRef {
        &self.loader
    }

    /// Priority group (ascending = earlier).
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether a terminal failure aborts the eager pass.
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Whether the component is skipped by the eager pass.
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Dependency names in declaration order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Per-component retry budget, if overridden.
    pub fn retry_budget(&self) -> Option<u32> {
        self.retry_budget
    }

    /// Per-component timeout, if overridden.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Registration sequence; orders members inside a priority group.
    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("critical", &self.critical)
            .field("lazy", &self.lazy)
            .field("dependencies", &self.dependencies)
            .field("retry_budget", &self.retry_budget)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoaderError;
    use crate::loaders::LoaderFn;
    use tokio_util::sync::CancellationToken;

    fn noop() -> LoaderRef {
        LoaderFn::arc(|_ctx: CancellationToken| async { Ok::<_, LoaderError>(()) })
    }

    #[test]
    fn defaults_apply_when_no_layer_sets_a_field() {
        let d = ComponentDescriptor::resolve("a".into(), noop(), ComponentOptions::new(), 0);
        assert_eq!(d.priority(), DEFAULT_PRIORITY);
        assert!(!d.is_critical());
        assert!(!d.is_lazy());
        assert!(d.dependencies().is_empty());
    }

    #[test]
    fn duplicate_dependencies_are_collapsed() {
        let opts = ComponentOptions::new().depends_on(["x", "y", "x"]);
        let d = ComponentDescriptor::resolve("a".into(), noop(), opts, 0);
        assert_eq!(d.dependencies(), ["x".to_string(), "y".to_string()]);
    }
}
