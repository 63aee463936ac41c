//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for observers of the load lifecycle
//! (diagnostic views, metrics, audit logs). Each subscriber is driven by a
//! dedicated worker fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they never block loads nor other subscribers.
//! - Delivery is fire-and-forget: when the queue declared by
//!   [`Subscribe::queue_capacity`] is full, the event is dropped for that
//!   subscriber and a `SubscriberOverflow` event is published.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use initvisor::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter(std::sync::atomic::AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::ModuleFailed {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
