//! # Partial component configuration.
//!
//! [`ComponentOptions`] is one configuration *layer*: every field is optional
//! and only the fields that are set override the layer below. The registry
//! resolves a component's final configuration as
//!
//! ```text
//! built-in defaults ─► profile[name] ─► options passed to register()
//!   (priority 100,       (builder         (call site)
//!    not critical,        with_profile)
//!    eager, no deps)
//! ```

use std::time::Duration;

/// One layer of component configuration with fluent setters.
///
/// # Example
/// ```
/// use initvisor::ComponentOptions;
///
/// let opts = ComponentOptions::new()
///     .priority(10)
///     .critical(true)
///     .depends_on(["settings", "i18n"]);
///
/// assert_eq!(opts.priority, Some(10));
/// assert_eq!(opts.lazy, None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentOptions {
    /// Priority group (ascending = earlier).
    pub priority: Option<i32>,
    /// Terminal failure aborts the eager pass.
    pub critical: Option<bool>,
    /// Excluded from the eager pass.
    pub lazy: Option<bool>,
    /// Names that must be loaded first.
    pub dependencies: Option<Vec<String>>,
    /// Total attempts allowed, overriding `Config::retry_budget`.
    pub retry_budget: Option<u32>,
    /// Per-attempt timeout, overriding `Config::timeout` (`Duration::ZERO` = none).
    pub timeout: Option<Duration>,
}

impl ComponentOptions {
    /// Empty layer (overrides nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the priority group.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Marks the component critical (or not).
    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = Some(critical);
        self
    }

    /// Marks the component lazy (or not).
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = Some(lazy);
        self
    }

    /// Replaces the dependency list.
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the retry budget (total attempts, including the first).
    pub fn retry_budget(mut self, attempts: u32) -> Self {
        self.retry_budget = Some(attempts);
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns `self` overridden by every field that `over` sets.
    pub fn overlay(self, over: &ComponentOptions) -> Self {
        Self {
            priority: over.priority.or(self.priority),
            critical: over.critical.or(self.critical),
            lazy: over.lazy.or(self.lazy),
            dependencies: over.dependencies.clone().or(self.dependencies),
            retry_budget: over.retry_budget.or(self.retry_budget),
            timeout: over.timeout.or(self.timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_only_replaces_set_fields() {
        let profile = ComponentOptions::new()
            .priority(5)
            .critical(true)
            .depends_on(["a"]);
        let call = ComponentOptions::new().priority(7);

        let merged = profile.overlay(&call);
        assert_eq!(merged.priority, Some(7));
        assert_eq!(merged.critical, Some(true));
        assert_eq!(merged.dependencies, Some(vec!["a".to_string()]));
        assert_eq!(merged.lazy, None);
    }

    #[test]
    fn empty_dependency_list_overrides_profile() {
        let profile = ComponentOptions::new().depends_on(["a", "b"]);
        let call = ComponentOptions::new().depends_on(Vec::<String>::new());

        assert_eq!(profile.overlay(&call).dependencies, Some(Vec::new()));
    }
}
