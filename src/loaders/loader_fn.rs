//! # Function-backed loader (`LoaderFn`)
//!
//! [`LoaderFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a
//! fresh future per attempt. Retries call the closure again; shared state, if
//! any, must live in an `Arc` captured by the closure.
//!
//! The closure may return any `T: Any + Send + Sync`; it becomes the
//! component's [`Export`].
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use initvisor::{LoaderError, LoaderFn, LoaderRef};
//!
//! let dice: LoaderRef = LoaderFn::arc(|_ctx: CancellationToken| async move {
//!     Ok::<_, LoaderError>(vec![4u8, 6, 8, 10, 12, 20])
//! });
//! # let _ = dice;
//! ```

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::LoaderError;
use crate::loaders::loader::{Export, Loader};

/// Function-backed loader implementation.
pub struct LoaderFn<F> {
    f: F,
}

impl<F> LoaderFn<F> {
    /// Wraps a closure.
    ///
    /// Prefer [`LoaderFn::arc`] when you immediately need a [`LoaderRef`](crate::LoaderRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, T> Loader for LoaderFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, LoaderError>> + Send + 'static,
    T: Any + Send + Sync,
{
    async fn load(&self, ctx: CancellationToken) -> Result<Export, LoaderError> {
        let value = (self.f)(ctx).await?;
        let export: Export = Arc::new(value);
        Ok(export)
    }
}
