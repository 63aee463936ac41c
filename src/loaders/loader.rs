//! # Loader abstraction.
//!
//! A [`Loader`] is the boundary to whatever a component actually is: the
//! orchestrator invokes it, awaits it, and keeps the value it returns.
//! Loaders **push** their result ([`Export`]) instead of the orchestrator
//! guessing where a loaded component put itself.
//!
//! A loader receives a [`CancellationToken`] that fires when its attempt times
//! out or the orchestrator shuts down; long loaders should watch it.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::LoaderError;

/// Value produced by a successful load, retrievable with
/// [`Orchestrator::export`](crate::Orchestrator::export).
pub type Export = Arc<dyn Any + Send + Sync>;

/// Shared handle to a loader.
pub type LoaderRef = Arc<dyn Loader>;

/// # Asynchronous, cancelable load operation.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use initvisor::{Export, Loader, LoaderError};
///
/// struct Settings;
///
/// #[async_trait]
/// impl Loader for Settings {
///     async fn load(&self, ctx: CancellationToken) -> Result<Export, LoaderError> {
///         if ctx.is_cancelled() {
///             return Err(LoaderError::Canceled);
///         }
///         Ok(Arc::new(vec!["volume=3".to_string()]))
///     }
/// }
/// ```
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    /// Performs one load attempt.
    async fn load(&self, ctx: CancellationToken) -> Result<Export, LoaderError>;
}
