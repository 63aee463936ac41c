//! # LogWriter - renders lifecycle events through `tracing`
//!
//! A subscriber that turns every [`Event`] into one structured `tracing`
//! record. Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`)
//! to see the output.
//!
//! ## Levels
//! - `error`: critical failure, aborted run
//! - `warn`: failed attempt, timeout, retry, terminal failure, unknown name,
//!   subscriber problems
//! - `info`: component loaded, loading complete
//! - `debug`: attempt start, group barriers
//!
//! ## Example output (fmt layer)
//! ```text
//! DEBUG initvisor: starting component="chat" attempt=1
//! WARN  initvisor: attempt failed component="chat" attempt=1 reason="loader of 'chat' failed: boom"
//! WARN  initvisor: retry scheduled component="chat" delay_ms=1000
//! INFO  initvisor: loaded component="chat" attempt=2 duration_ms=12
//! ERROR initvisor: critical component failed; blocking further groups component="core"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let component = e.component.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::ModuleStarting => {
                tracing::debug!(target: "initvisor", component, attempt = e.attempt, priority = e.priority, "starting");
            }
            EventKind::ModuleLoaded => {
                tracing::info!(target: "initvisor", component, attempt = e.attempt, duration_ms = e.duration_ms, "loaded");
            }
            EventKind::AttemptFailed => {
                tracing::warn!(target: "initvisor", component, attempt = e.attempt, reason, "attempt failed");
            }
            EventKind::TimeoutHit => {
                tracing::warn!(target: "initvisor", component, attempt = e.attempt, timeout_ms = e.timeout_ms, "timeout");
            }
            EventKind::RetryScheduled => {
                tracing::warn!(target: "initvisor", component, after_attempt = e.attempt, delay_ms = e.delay_ms, "retry scheduled");
            }
            EventKind::ModuleFailed => {
                tracing::warn!(target: "initvisor", component, attempts = e.attempt, reason, "failed");
            }
            EventKind::ModuleNotFound => {
                tracing::warn!(target: "initvisor", component, requested_by = reason, "not registered");
            }
            EventKind::CriticalFailure => {
                tracing::error!(target: "initvisor", component, reason, "critical component failed; blocking further groups");
            }
            EventKind::GroupStarting => {
                tracing::debug!(target: "initvisor", priority = e.priority, members = e.count, "group starting");
            }
            EventKind::GroupCompleted => {
                tracing::debug!(target: "initvisor", priority = e.priority, loaded = e.loaded, failed = e.failed, duration_ms = e.duration_ms, "group completed");
            }
            EventKind::LoadingComplete => {
                tracing::info!(target: "initvisor", loaded = e.loaded, failed = e.failed, duration_ms = e.duration_ms, "loading complete");
            }
            EventKind::RunAborted => {
                tracing::error!(target: "initvisor", component, priority = e.priority, reason, "run aborted");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                tracing::warn!(target: "initvisor", subscriber = component, reason, "subscriber problem");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
