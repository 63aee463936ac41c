//! Per-component state and per-attempt records.

use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::error::LoadError;

/// Load state of one component.
///
/// ```text
/// Registered ─► Loading ─┬─► Loaded
///                        ├─► Failed (retryable) ─► Loading (after delay)
///                        └─► Failed (terminal)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Registered, never requested.
    Registered,
    /// An attempt is in progress. Between attempts, while a retry delay is
    /// pending, the state stays [`LoadState::Failed`].
    Loading,
    /// Loaded successfully (terminal).
    Loaded,
    /// Failed; terminal unless a retry is scheduled.
    Failed,
}

impl LoadState {
    /// Stable snake_case label.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoadState::Registered => "registered",
            LoadState::Loading => "loading",
            LoadState::Loaded => "loaded",
            LoadState::Failed => "failed",
        }
    }
}

/// Outcome of one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The loader returned successfully.
    Loaded,
    /// The attempt failed (loader error, timeout, dependency or structural error).
    Failed,
}

/// Timing and outcome of one attempt.
#[derive(Clone, Debug, Serialize)]
pub struct AttemptRecord {
    /// Component name.
    pub component: String,
    /// Attempt index (1-based).
    pub attempt: u32,
    /// Wall-clock start.
    pub started_at: SystemTime,
    /// Wall-clock end.
    pub finished_at: SystemTime,
    /// Monotonic elapsed time.
    pub duration: Duration,
    /// Attempt outcome.
    pub outcome: AttemptOutcome,
    /// Error of a failed attempt.
    pub error: Option<LoadError>,
}

impl AttemptRecord {
    /// True for a successful attempt.
    pub fn is_success(&self) -> bool {
        self.outcome == AttemptOutcome::Loaded
    }
}

/// Diagnostic snapshot of one component.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModuleStatus {
    /// Component name.
    pub name: String,
    /// Latest state.
    pub state: LoadState,
    /// Attempts made so far.
    pub attempts: u32,
    /// Latest error, if any.
    pub last_error: Option<LoadError>,
    /// Duration of the last successful attempt.
    pub last_duration: Option<Duration>,
}

impl ModuleStatus {
    /// Status of a component that was never requested.
    pub fn registered(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: LoadState::Registered,
            attempts: 0,
            last_error: None,
            last_duration: None,
        }
    }
}
