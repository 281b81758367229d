//! # Runtime events emitted by the dashboard.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Registration events**: units entering/leaving rotation, visibility changes
//! - **Update events**: dispatch and completion of unit updates
//! - **Fault events**: isolation, recovery attempts and their outcomes
//! - **Runtime events**: subscriber health and shutdown
//!
//! The [`Event`] struct carries additional metadata such as timestamps, unit id,
//! reasons, failure kinds and backoff delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use widgetvisor::{Event, EventKind, FailureKind};
//!
//! let ev = Event::new(EventKind::UpdateFailed)
//!     .with_unit("weather")
//!     .with_reason("dns lookup failed")
//!     .with_failure_kind(FailureKind::TRANSIENT)
//!     .with_delay(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::UpdateFailed);
//! assert_eq!(ev.unit.as_deref(), Some("weather"));
//! assert_eq!(ev.reason.as_deref(), Some("dns lookup failed"));
//! assert_eq!(ev.delay_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::error::FailureKind;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `unit`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `unit`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested (OS signal or cancellation token).
    ShutdownRequested,

    /// All in-flight updates finished within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some updates were still outstanding.
    ///
    /// Sets:
    /// - `reason`: comma-separated ids of units still running something
    GraceExceeded,

    // === Registration events ===
    /// Unit enrolled in the scheduler.
    ///
    /// Sets:
    /// - `unit`: unit id
    UnitRegistered,

    /// Unit removed; an in-flight update (if any) keeps running and is discarded.
    ///
    /// Sets:
    /// - `unit`: unit id
    UnitUnregistered,

    /// Unit visibility toggled.
    ///
    /// Sets:
    /// - `unit`: unit id
    /// - `reason`: `"shown"` or `"hidden"`
    VisibilityChanged,

    // === Update events ===
    /// Update dispatched.
    ///
    /// Sets:
    /// - `unit`: unit id
    UpdateStarting,

    /// Update completed successfully.
    ///
    /// Sets:
    /// - `unit`: unit id
    UpdateSucceeded,

    /// Update failed (error, panic or timeout).
    ///
    /// Sets:
    /// - `unit`: unit id
    /// - `reason`: failure message
    /// - `failure_kind`: kind tag
    UpdateFailed,

    /// Update exceeded the per-update timeout (always followed by `UpdateFailed`).
    ///
    /// Sets:
    /// - `unit`: unit id
    /// - `timeout_ms`: configured timeout
    UpdateTimedOut,

    /// Result of an update was dropped: its unit was unregistered, or
    /// isolated after the update was dispatched.
    ///
    /// Sets:
    /// - `unit`: unit id
    /// - `reason`: set when the result predates the unit's latest isolation
    UpdateDiscarded,

    /// Widget reported a failure outside the scheduler's dispatch path.
    ///
    /// Sets:
    /// - `unit`: unit id
    /// - `reason`: `context: message`
    /// - `failure_kind`: kind tag
    ErrorReported,

    // === Fault events ===
    /// Unit removed from rotation by the isolation policy or an operator.
    ///
    /// Sets:
    /// - `unit`: unit id
    /// - `reason`: which threshold tripped, or the operator's note
    UnitIsolated,

    /// Next recovery attempt scheduled.
    ///
    /// Sets:
    /// - `unit`: unit id
    /// - `attempt`: failed attempts so far
    /// - `delay_ms`: delay before the attempt
    RecoveryScheduled,

    /// Recovery strategy started.
    ///
    /// Sets:
    /// - `unit`: unit id
    /// - `attempt`: attempt number (1-based)
    /// - `failure_kind`: kind used for strategy lookup
    /// - `reason`: strategy name
    RecoveryStarting,

    /// Strategy succeeded; unit is back in rotation.
    ///
    /// Sets:
    /// - `unit`: unit id
    /// - `attempt`: attempt number
    RecoverySucceeded,

    /// Strategy failed.
    ///
    /// Sets:
    /// - `unit`: unit id
    /// - `attempt`: failed attempts so far
    RecoveryFailed,

    /// Unit exhausted its recovery attempts and awaits operator action.
    ///
    /// Sets:
    /// - `unit`: unit id
    /// - `attempt`: failed attempts
    UnitPermanentlyFailed,

    /// Operator forced an immediate recovery attempt.
    ///
    /// Sets:
    /// - `unit`: unit id
    ForceRecoveryRequested,

    /// Retention sweep removed old error records.
    ///
    /// Sets:
    /// - `count`: number of records removed
    HistorySwept,
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

    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Recovery attempt number or count of failed attempts.
    pub attempt: Option<u32>,
    /// Number of items affected (records swept, etc.).
    pub count: Option<u32>,
    /// Unit id, if applicable.
    pub unit: Option<Arc<str>>,
    /// Failure kind tag, if applicable.
    pub failure_kind: Option<FailureKind>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            kind,
            at: SystemTime::now(),
            attempt: None,
            count: None,
            timeout_ms: None,
            reason: None,
            delay_ms: None,
            failure_kind: None,
            unit: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a unit id.
    #[inline]
    pub fn with_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis_u32(d));
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(millis_u32(d));
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches an item count, saturating at `u32::MAX`.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a failure kind.
    #[inline]
    pub fn with_failure_kind(mut self, kind: FailureKind) -> Self {
        self.failure_kind = Some(kind);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_unit(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_unit(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

fn millis_u32(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
