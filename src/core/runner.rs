//! # Run a single loader invocation.
//!
//! Executes one call of a [`Loader`] with an optional timeout and publishes
//! the invocation-level events to [`Bus`].
//!
//! ## Event flow
//!
//! ```text
//! publish ModuleStarting
//!   loader.load(child) → Ok(export)                 → Ok(export)
//!   loader.load(child) → Err(Fail { reason })       → LoaderThrew(reason)
//!   loader.load(child) → Err(Canceled)              → Cancelled
//!   loader panics                                   → LoaderThrew(panic message)
//!   timeout exceeded   → cancel child → TimeoutHit  → LoaderThrew("timed out after ..")
//! ```
//!
//! ## Rules
//! - Derives a **child token** per invocation (isolated cancellation)
//! - Child cancellation does **not** affect the parent
//! - Terminal per-attempt events (`ModuleLoaded` / `AttemptFailed`) are published
//!   by the retry controller, which also sees dependency failures

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{LoadError, LoaderError},
    events::{Bus, Event, EventKind},
    loaders::{Export, Loader},
    subscribers::panic_message,
};

/// Invokes `loader` once on behalf of `component`.
///
/// ### Timeout behavior
/// If `timeout` is `Some(dur)` and `dur > 0`:
/// - Wraps execution in `tokio::time::timeout`
/// - On timeout: cancels the child token, publishes `TimeoutHit`, returns `LoaderThrew`
pub(crate) async fn run_once<L: Loader + ?Sized>(
    loader: &L,
    component: &str,
    parent: &CancellationToken,
    timeout: Option<Duration>,
    attempt: u32,
    bus: &Bus,
) -> Result<Export, LoadError> {
    let child = parent.child_token();
    bus.publish(
        Event::now(EventKind::ModuleStarting)
            .with_component(component)
            .with_attempt(attempt),
    );

    let call = AssertUnwindSafe(loader.load(child.clone())).catch_unwind();
    let res = if let Some(dur) = timeout.filter(|d| *d > Duration::ZERO) {
        match time::timeout(dur, call).await {
            Ok(r) => r,
            Err(_elapsed) => {
                child.cancel();
                publish_timeout(bus, component, dur, attempt);
                return Err(LoadError::LoaderThrew {
                    component: component.to_string(),
                    reason: format!("timed out after {}ms", dur.as_millis()),
                });
            }
        }
    } else {
        call.await
    };

    match res {
        Ok(Ok(export)) => Ok(export),
        Ok(Err(LoaderError::Fail { reason })) => Err(LoadError::LoaderThrew {
            component: component.to_string(),
            reason,
        }),
        Ok(Err(LoaderError::Canceled)) => Err(LoadError::Cancelled {
            component: component.to_string(),
        }),
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            tracing::warn!(component, attempt, %reason, "loader panicked");
            Err(LoadError::LoaderThrew {
                component: component.to_string(),
                reason: format!("panicked: {reason}"),
            })
        }
    }
}

/// Publishes `TimeoutHit` (always followed by `AttemptFailed`).
fn publish_timeout(bus: &Bus, component: &str, dur: Duration, attempt: u32) {
    bus.publish(
        Event::now(EventKind::TimeoutHit)
            .with_component(component)
            .with_timeout(dur)
            .with_attempt(attempt),
    );
}
