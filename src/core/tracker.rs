//! # Status tracker.
//!
//! Owns the append-only list of [`AttemptRecord`]s and the per-component
//! [`ModuleStatus`] map. Every load flow writes here; reports are computed
//! from a copy of the records so readers never hold the lock.
//!
//! ```text
//! begin(name)          → state = Loading, attempts += 1
//! record(AttemptRecord)→ append; state = Loaded | Failed
//! settle(name, err)    → terminal error (e.g. RetryLimitExceeded) replaces last_error
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::LoadError;
use crate::status::{AttemptRecord, LoadState, ModuleStatus, RunReport, Statistics};

#[derive(Default)]
struct Inner {
    records: Vec<AttemptRecord>,
    status: HashMap<String, ModuleStatus>,
}

/// Thread-safe record store.
#[derive(Default)]
pub(crate) struct StatusTracker {
    inner: RwLock<Inner>,
}

impl StatusTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Marks the start of an attempt.
    pub(crate) fn begin(&self, name: &str) {
        let mut inner = self.write();
        let status = inner
            .status
            .entry(name.to_string())
            .or_insert_with(|| ModuleStatus::registered(name));
        status.state = LoadState::Loading;
        status.attempts += 1;
    }

    /// Appends one attempt record and folds it into the component status.
    pub(crate) fn record(&self, rec: AttemptRecord) {
        let mut inner = self.write();
        let status = inner
            .status
            .entry(rec.component.clone())
            .or_insert_with(|| ModuleStatus::registered(rec.component.as_str()));

        status.attempts = status.attempts.max(rec.attempt);
        if rec.is_success() {
            status.state = LoadState::Loaded;
            status.last_duration = Some(rec.duration);
        } else {
            status.state = LoadState::Failed;
            status.last_error = rec.error.clone();
        }
        inner.records.push(rec);
    }

    /// Stores the terminal error of a component that will not be retried.
    pub(crate) fn settle_failed(&self, name: &str, err: &LoadError) {
        let mut inner = self.write();
        let status = inner
            .status
            .entry(name.to_string())
            .or_insert_with(|| ModuleStatus::registered(name));
        status.state = LoadState::Failed;
        status.last_error = Some(err.clone());
    }

    pub(crate) fn status(&self, name: &str) -> Option<ModuleStatus> {
        self.read().status.get(name).cloned()
    }

    pub(crate) fn records(&self) -> Vec<AttemptRecord> {
        self.read().records.clone()
    }

    pub(crate) fn report(&self) -> RunReport {
        RunReport::from_records(self.records())
    }

    pub(crate) fn statistics(&self) -> Statistics {
        Statistics::from_records(&self.records())
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::AttemptOutcome;
    use std::time::{Duration, SystemTime};

    fn failed(component: &str, attempt: u32) -> AttemptRecord {
        let now = SystemTime::now();
        AttemptRecord {
            component: component.into(),
            attempt,
            started_at: now,
            finished_at: now,
            duration: Duration::from_millis(3),
            outcome: AttemptOutcome::Failed,
            error: Some(LoadError::LoaderThrew {
                component: component.into(),
                reason: "nope".into(),
            }),
        }
    }

    #[test]
    fn status_follows_attempts() {
        let tracker = StatusTracker::new();

        tracker.begin("db");
        assert_eq!(tracker.status("db").unwrap().state, LoadState::Loading);

        tracker.record(failed("db", 1));
        let st = tracker.status("db").unwrap();
        assert_eq!(st.state, LoadState::Failed);
        assert_eq!(st.attempts, 1);
        assert_eq!(st.last_duration, None);

        tracker.begin("db");
        assert_eq!(tracker.status("db").unwrap().state, LoadState::Loading);
        assert_eq!(tracker.status("db").unwrap().attempts, 2);
    }

    #[test]
    fn last_duration_keeps_the_successful_attempt() {
        let tracker = StatusTracker::new();
        let mut ok = failed("db", 1);
        ok.outcome = AttemptOutcome::Loaded;
        ok.error = None;
        ok.duration = Duration::from_millis(9);

        tracker.begin("db");
        tracker.record(ok);
        tracker.begin("db");
        tracker.record(failed("db", 2));

        let st = tracker.status("db").unwrap();
        assert_eq!(st.state, LoadState::Failed);
        assert_eq!(st.last_duration, Some(Duration::from_millis(9)));
    }

    #[test]
    fn terminal_error_replaces_attempt_error() {
        let tracker = StatusTracker::new();
        tracker.begin("db");
        tracker.record(failed("db", 1));

        let terminal = LoadError::RetryLimitExceeded {
            component: "db".into(),
            attempts: 1,
            last: "nope".into(),
        };
        tracker.settle_failed("db", &terminal);

        assert_eq!(tracker.status("db").unwrap().last_error, Some(terminal));
        assert_eq!(tracker.records().len(), 1);
        assert_eq!(tracker.report().failed, 1);
    }

    #[test]
    fn unknown_component_has_no_status() {
        assert!(StatusTracker::new().status("ghost").is_none());
    }
}
