//! Error types used by the initvisor runtime and loaders.
//!
//! This module defines three error enums:
//!
//! - [`LoaderError`] - what a component's loader returns when it gives up.
//! - [`LoadError`] - the outcome of loading one component, shared by every
//!   caller waiting on the same load.
//! - [`RuntimeError`] - errors raised by the orchestrator itself.
//!
//! All of them provide `as_label` for logs/metrics. [`LoadError`] additionally
//! classifies itself with [`LoadError::is_retryable`] and [`LoadError::is_structural`].

use serde::Serialize;
use thiserror::Error;

/// # Errors returned by a loader.
///
/// A loader reports failure by returning one of these; the orchestrator turns it
/// into [`LoadError::LoaderThrew`] (or [`LoadError::Cancelled`]).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// Loading failed but may succeed if retried.
    #[error("load failed: {reason}")]
    Fail {
        /// The underlying error message.
        reason: String,
    },

    /// Loader observed cancellation and stopped.
    #[error("context cancelled")]
    Canceled,
}

impl LoaderError {
    /// Shorthand for [`LoaderError::Fail`].
    pub fn fail(reason: impl Into<String>) -> Self {
        LoaderError::Fail {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoaderError::Fail { .. } => "loader_failed",
            LoaderError::Canceled => "loader_canceled",
        }
    }
}

/// # Outcome errors of a component load.
///
/// Structural errors (`NotRegistered`, `CyclicDependency`) are never retried.
/// `LoaderThrew` is retried until the component's budget runs out, which turns
/// it into `RetryLimitExceeded`. `DependencyFailed` is classed as retryable, but
/// a dependency only fails once it has settled for good, so the dependent's
/// flow ends with it immediately.
///
/// The type is `Clone` so that every caller sharing one in-flight load observes
/// the same error.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadError {
    /// The requested component (or one of its dependencies) is not registered.
    #[error("component '{name}' is not registered")]
    NotRegistered {
        /// Missing component name.
        name: String,
    },

    /// Dependency graph contains a cycle reachable from the requested component.
    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Names along the cycle; the first name is repeated at the end.
        cycle: Vec<String>,
    },

    /// The component's own loader failed or timed out.
    #[error("loader of '{component}' failed: {reason}")]
    LoaderThrew {
        /// Component whose loader failed.
        component: String,
        /// Failure message.
        reason: String,
    },

    /// A dependency did not reach `Loaded`, so the loader was not invoked.
    #[error("'{component}' cannot load: dependency '{dependency}' failed: {reason}")]
    DependencyFailed {
        /// Component that was waiting.
        component: String,
        /// Dependency that failed.
        dependency: String,
        /// Dependency failure message.
        reason: String,
    },

    /// Retry budget exhausted.
    #[error("'{component}' gave up after {attempts} attempt(s): {last}")]
    RetryLimitExceeded {
        /// Component that gave up.
        component: String,
        /// Number of attempts made.
        attempts: u32,
        /// Message of the last failed attempt.
        last: String,
    },

    /// The orchestrator was shut down while the load was pending.
    #[error("load of '{component}' cancelled")]
    Cancelled {
        /// Component whose load was cancelled.
        component: String,
    },
}

impl LoadError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use initvisor::LoadError;
    ///
    /// let err = LoadError::NotRegistered { name: "ghost".into() };
    /// assert_eq!(err.as_label(), "not_registered");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LoadError::NotRegistered { .. } => "not_registered",
            LoadError::CyclicDependency { .. } => "cyclic_dependency",
            LoadError::LoaderThrew { .. } => "loader_threw",
            LoadError::DependencyFailed { .. } => "dependency_failed",
            LoadError::RetryLimitExceeded { .. } => "retry_limit_exceeded",
            LoadError::Cancelled { .. } => "cancelled",
        }
    }

    /// Indicates whether another attempt may succeed.
    ///
    /// Returns `true` for [`LoadError::LoaderThrew`] and [`LoadError::DependencyFailed`].
    ///
    /// # Example
    /// ```
    /// use initvisor::LoadError;
    ///
    /// let threw = LoadError::LoaderThrew { component: "a".into(), reason: "boom".into() };
    /// assert!(threw.is_retryable());
    ///
    /// let cycle = LoadError::CyclicDependency { cycle: vec!["a".into(), "a".into()] };
    /// assert!(!cycle.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoadError::LoaderThrew { .. } | LoadError::DependencyFailed { .. }
        )
    }

    /// Structural errors come from the registry shape and never consume retry budget.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            LoadError::NotRegistered { .. } | LoadError::CyclicDependency { .. }
        )
    }
}

/// # Errors produced by the orchestrator runtime.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    /// `register` was called after the first load started.
    #[error("registry is sealed; cannot register '{name}' after loading started")]
    RegistrySealed {
        /// Name that was being registered.
        name: String,
    },

    /// A critical component failed terminally; the eager pass was aborted.
    #[error("critical component '{component}' failed: {source}")]
    CriticalFailure {
        /// The critical component.
        component: String,
        /// Its terminal load error.
        #[source]
        source: LoadError,
    },

    /// The orchestrator was shut down while the eager pass was running.
    #[error("loading cancelled by shutdown")]
    Cancelled,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::RegistrySealed { .. } => "runtime_registry_sealed",
            RuntimeError::CriticalFailure { .. } => "runtime_critical_failure",
            RuntimeError::Cancelled => "runtime_cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_errors_are_not_retryable() {
        let missing = LoadError::NotRegistered { name: "x".into() };
        assert!(missing.is_structural());
        assert!(!missing.is_retryable());

        let dep = LoadError::DependencyFailed {
            component: "b".into(),
            dependency: "a".into(),
            reason: "boom".into(),
        };
        assert!(dep.is_retryable());
        assert!(!dep.is_structural());
    }

    #[test]
    fn cycle_message_lists_path() {
        let err = LoadError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency: a -> b -> a");
    }

    #[test]
    fn critical_failure_exposes_source() {
        use std::error::Error as _;

        let err = RuntimeError::CriticalFailure {
            component: "core".into(),
            source: LoadError::Cancelled {
                component: "core".into(),
            },
        };
        assert_eq!(err.as_label(), "runtime_critical_failure");
        assert!(err.source().is_some());
    }
}
