//! # Lifecycle events emitted by the orchestrator.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Component events**: one component's load flow (starting, loaded, failed, retry)
//! - **Run events**: the eager pass (group barriers, completion, abort)
//! - **Lookup events**: requests for names that are not registered
//! - **Subscriber events**: delivery problems inside the fan-out
//!
//! The [`Event`] struct carries the optional metadata: component name, attempt,
//! priority, timing and failure reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use initvisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::AttemptFailed)
//!     .with_component("chat")
//!     .with_reason("boom")
//!     .with_attempt(2)
//!     .with_duration(Duration::from_millis(40));
//!
//! assert_eq!(ev.kind, EventKind::AttemptFailed);
//! assert_eq!(ev.component.as_deref(), Some("chat"));
//! assert_eq!(ev.duration_ms, Some(40));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Component events ===
    /// An attempt is about to invoke the loader.
    ///
    /// Sets: `component`, `attempt`.
    ModuleStarting,

    /// Component reached `Loaded`.
    ///
    /// Sets: `component`, `attempt`, `duration_ms`.
    ModuleLoaded,

    /// One attempt failed (loader error, timeout or failed dependency).
    ///
    /// Sets: `component`, `attempt`, `duration_ms`, `reason`.
    AttemptFailed,

    /// The loader exceeded its timeout (always followed by `AttemptFailed`).
    ///
    /// Sets: `component`, `attempt`, `timeout_ms`.
    TimeoutHit,

    /// Deferred re-attempt scheduled.
    ///
    /// Sets: `component`, `attempt` (the failed one), `delay_ms`, `reason`.
    RetryScheduled,

    /// Component reached terminal `Failed`.
    ///
    /// Sets: `component`, `attempt`, `reason`.
    ModuleFailed,

    /// A critical component failed terminally; the eager pass will abort.
    ///
    /// Sets: `component`, `reason`.
    CriticalFailure,

    // === Lookup events ===
    /// A load was requested for an unregistered name.
    ///
    /// Sets: `component` (the missing name), `reason` (who asked, if a dependency).
    ModuleNotFound,

    // === Run events ===
    /// A priority group is starting.
    ///
    /// Sets: `priority`, `count` (members to load).
    GroupStarting,

    /// Every member of a priority group reached a terminal outcome.
    ///
    /// Sets: `priority`, `loaded`, `failed`, `duration_ms`.
    GroupCompleted,

    /// The eager pass finished every group.
    ///
    /// Sets: `loaded`, `failed`, `duration_ms`.
    LoadingComplete,

    /// The eager pass stopped early because a critical component failed.
    ///
    /// Sets: `component`, `priority`, `reason`.
    RunAborted,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `component` (subscriber name), `reason`.
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `component` (subscriber name), `reason`.
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Component name, if applicable.
    pub component: Option<Arc<str>>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Priority group.
    pub priority: Option<i32>,
    /// Elapsed time of the attempt, group or run in milliseconds.
    pub duration_ms: Option<u32>,
    /// Delay before the next attempt in milliseconds.
    pub delay_ms: Option<u32>,
    /// Loader timeout in milliseconds.
    pub timeout_ms: Option<u32>,
    /// Number of members in a group.
    pub count: Option<u32>,
    /// Loaded components (group or run totals).
    pub loaded: Option<u32>,
    /// Failed components (group or run totals).
    pub failed: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            component: None,
            attempt: None,
            priority: None,
            duration_ms: None,
            delay_ms: None,
            timeout_ms: None,
            count: None,
            loaded: None,
            failed: None,
            reason: None,
        }
    }

    /// Attaches a component name.
    #[inline]
    pub fn with_component(mut self, name: impl Into<Arc<str>>) -> Self {
        self.component = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a priority group.
    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_duration(mut self, d: Duration) -> Self {
        self.duration_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a loader timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a member count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(saturate(n));
        self
    }

    /// Attaches loaded/failed totals.
    #[inline]
    pub fn with_totals(mut self, loaded: usize, failed: usize) -> Self {
        self.loaded = Some(saturate(loaded));
        self.failed = Some(saturate(failed));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_component(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_component(subscriber)
            .with_reason(info)
    }

    /// True for events produced by the subscriber fan-out itself.
    #[inline]
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
