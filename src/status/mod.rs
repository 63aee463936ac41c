//! Load status, attempt records and reports.
//!
//! - [`LoadState`], [`ModuleStatus`] per-component diagnostics
//! - [`AttemptRecord`], [`AttemptOutcome`] one entry per attempt
//! - [`RunReport`], [`Statistics`] aggregates computed from the records

mod record;
mod report;

pub use record::{AttemptOutcome, AttemptRecord, LoadState, ModuleStatus};
pub use report::{ComponentTiming, RunReport, Statistics};
