//! Runtime core: registration, resolution and the load pipeline.
//!
//! The public API from this module is [`Orchestrator`] (built via
//! [`OrchestratorBuilder`]) and [`Config`].
//!
//! Internal modules:
//! - [`registry`]: descriptor table with option layering, sealed on first load;
//! - [`resolver`]: DFS over dependencies with cycle and missing-name detection;
//! - [`flight`]: single-flight table, one load flow per component;
//! - [`retry`]: per-component retry controller with backoff;
//! - [`runner`]: executes one loader call with timeout and event publishing;
//! - [`tracker`]: attempt records and per-component status.

mod builder;
mod config;
mod flight;
mod orchestrator;
mod registry;
mod resolver;
mod retry;
mod runner;
mod tracker;

#[cfg(test)]
mod tests;

pub use builder::OrchestratorBuilder;
pub use config::Config;
pub use orchestrator::Orchestrator;
