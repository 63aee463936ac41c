//! # Loader abstractions.
//!
//! - [`Loader`] - trait for async, cancelable load operations
//! - [`LoaderFn`] - closure-backed implementation
//! - [`LoaderRef`] - shared reference to a loader (`Arc<dyn Loader>`)
//! - [`Export`] - the value a loader hands back

mod loader;
mod loader_fn;

pub use loader::{Export, Loader, LoaderRef};
pub use loader_fn::LoaderFn;
