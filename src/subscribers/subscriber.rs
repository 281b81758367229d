//! # Event subscriber trait.
//!
//! Provides [`Subscribe`], the extension point for plugging observers (status
//! bars, audit logs, metrics exporters) into the dashboard's event stream.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently of the tick loop)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `EventKind::SubscriberPanicked`)
//!
//! A slow subscriber never delays a tick: overflow drops the event for that
//! subscriber only and publishes `EventKind::SubscriberOverflow`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use widgetvisor::{Event, EventKind, Subscribe};
//!
//! struct IsolationAlerts;
//!
//! #[async_trait]
//! impl Subscribe for IsolationAlerts {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::UnitIsolated) {
//!             // page the operator, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "isolation-alerts" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for dashboard observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event, in FIFO order per subscriber.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber (clamped to at least 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
