//! Aggregates computed purely from [`AttemptRecord`]s.
//!
//! A component's outcome is the outcome of its **latest** record: a component
//! that failed twice and then loaded counts as loaded, with two retries.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Serialize;

use super::record::AttemptRecord;

/// A component paired with a load duration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentTiming {
    /// Component name.
    pub component: String,
    /// Duration of its successful attempt.
    pub duration: Duration,
}

/// Report of everything attempted so far.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// Every attempt, in append order.
    pub records: Vec<AttemptRecord>,
    /// Components whose latest attempt succeeded.
    pub loaded: usize,
    /// Components whose latest attempt failed.
    pub failed: usize,
    /// `loaded / (loaded + failed)`; `0.0` when nothing was attempted.
    pub success_rate: f64,
    /// Mean duration of successful attempts.
    pub average_duration: Option<Duration>,
    /// Slowest successful component.
    pub slowest: Option<ComponentTiming>,
    /// Fastest successful component.
    pub fastest: Option<ComponentTiming>,
}

impl RunReport {
    /// Builds the report from attempt records.
    pub fn from_records(records: Vec<AttemptRecord>) -> Self {
        let (loaded, failed) = outcome_counts(&records);
        let timings = success_timings(&records);

        Self {
            loaded,
            failed,
            success_rate: ratio(loaded, loaded + failed),
            average_duration: average(&timings),
            slowest: timings.iter().max_by_key(|t| t.duration).cloned(),
            fastest: timings.iter().min_by_key(|t| t.duration).cloned(),
            records,
        }
    }

    /// Names of loaded components in the order they finished loading.
    pub fn loaded_components(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.component.as_str())
            .collect()
    }

    /// Records of one component.
    pub fn attempts_of<'a>(&'a self, component: &'a str) -> impl Iterator<Item = &'a AttemptRecord> + 'a {
        self.records.iter().filter(move |r| r.component == component)
    }

    /// Renders the report as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Extended statistics for diagnostic views.
#[derive(Clone, Debug, Serialize)]
pub struct Statistics {
    /// Components with at least one record.
    pub components: usize,
    /// Components whose latest attempt succeeded.
    pub loaded: usize,
    /// Components whose latest attempt failed.
    pub failed: usize,
    /// All attempts.
    pub total_attempts: usize,
    /// Failed attempts.
    pub failed_attempts: usize,
    /// Attempts beyond the first, summed over components.
    pub retries: usize,
    /// Component-level success rate.
    pub success_rate: f64,
    /// Attempt-level success rate.
    pub attempt_success_rate: f64,
    /// Sum of successful attempt durations.
    pub total_load_time: Duration,
    /// Mean successful duration.
    pub average_duration: Option<Duration>,
    /// Median successful duration.
    pub median_duration: Option<Duration>,
    /// Slowest successful component.
    pub slowest: Option<ComponentTiming>,
    /// Fastest successful component.
    pub fastest: Option<ComponentTiming>,
    /// Failed attempts grouped by error label.
    pub errors_by_kind: BTreeMap<&'static str, usize>,
}

impl Statistics {
    /// Computes statistics from attempt records.
    pub fn from_records(records: &[AttemptRecord]) -> Self {
        let (loaded, failed) = outcome_counts(records);
        let components = loaded + failed;
        let failed_attempts = records.iter().filter(|r| !r.is_success()).count();

        let mut timings = success_timings(records);
        timings.sort_by_key(|t| t.duration);

        let mut errors_by_kind = BTreeMap::new();
        for err in records.iter().filter_map(|r| r.error.as_ref()) {
            *errors_by_kind.entry(err.as_label()).or_insert(0) += 1;
        }

        Self {
            components,
            loaded,
            failed,
            total_attempts: records.len(),
            failed_attempts,
            retries: records.len().saturating_sub(components),
            success_rate: ratio(loaded, components),
            attempt_success_rate: ratio(records.len() - failed_attempts, records.len()),
            total_load_time: timings.iter().map(|t| t.duration).sum(),
            average_duration: average(&timings),
            median_duration: timings.get(timings.len() / 2).map(|t| t.duration),
            slowest: timings.last().cloned(),
            fastest: timings.first().cloned(),
            errors_by_kind,
        }
    }
}

fn outcome_counts(records: &[AttemptRecord]) -> (usize, usize) {
    let mut latest: HashMap<&str, bool> = HashMap::new();
    for r in records {
        latest.insert(r.component.as_str(), r.is_success());
    }
    let loaded = latest.values().filter(|ok| **ok).count();
    (loaded, latest.len() - loaded)
}

fn success_timings(records: &[AttemptRecord]) -> Vec<ComponentTiming> {
    records
        .iter()
        .filter(|r| r.is_success())
        .map(|r| ComponentTiming {
            component: r.component.clone(),
            duration: r.duration,
        })
        .collect()
}

fn average(timings: &[ComponentTiming]) -> Option<Duration> {
    let n = u32::try_from(timings.len()).ok().filter(|n| *n > 0)?;
    let total: Duration = timings.iter().map(|t| t.duration).sum();
    Some(total / n)
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
