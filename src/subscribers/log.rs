//! # LogWriter: forwards dashboard events to `tracing`.
//!
//! Routine traffic (dispatches, successes) is logged at `debug`/`trace`,
//! failures at `warn`, terminal states at `error`. Install any `tracing`
//! subscriber (e.g. `tracing_subscriber::fmt`) to see the output.
//!
//! ## Example output (fmt layer)
//! ```text
//! WARN widgetvisor: update failed unit=weather kind=transient reason="dns lookup failed"
//! WARN widgetvisor: unit isolated unit=weather reason="3 consecutive failures"
//! INFO widgetvisor: recovery scheduled unit=weather attempt=0 delay_ms=30000
//! ERROR widgetvisor: unit permanently failed unit=weather attempt=3
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber backed by `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let unit = e.unit.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::UnitRegistered => tracing::info!(target: "widgetvisor", unit, "unit registered"),
            EventKind::UnitUnregistered => {
                tracing::info!(target: "widgetvisor", unit, "unit unregistered")
            }
            EventKind::VisibilityChanged => {
                tracing::debug!(target: "widgetvisor", unit, visibility = reason, "visibility changed")
            }
            EventKind::UpdateStarting => tracing::trace!(target: "widgetvisor", unit, "update starting"),
            EventKind::UpdateSucceeded => tracing::trace!(target: "widgetvisor", unit, "update succeeded"),
            EventKind::UpdateFailed | EventKind::ErrorReported => {
                let kind = e.failure_kind.as_ref().map(|k| k.as_str()).unwrap_or("-");
                tracing::warn!(target: "widgetvisor", unit, kind, reason, "update failed");
            }
            EventKind::UpdateTimedOut => {
                tracing::warn!(target: "widgetvisor", unit, timeout_ms = e.timeout_ms, "update timed out")
            }
            EventKind::UpdateDiscarded => {
                tracing::debug!(target: "widgetvisor", unit, "late result discarded")
            }
            EventKind::UnitIsolated => tracing::warn!(target: "widgetvisor", unit, reason, "unit isolated"),
            EventKind::RecoveryScheduled => tracing::info!(
                target: "widgetvisor",
                unit,
                attempt = e.attempt,
                delay_ms = e.delay_ms,
                "recovery scheduled"
            ),
            EventKind::RecoveryStarting => tracing::info!(
                target: "widgetvisor",
                unit,
                attempt = e.attempt,
                strategy = reason,
                "recovery starting"
            ),
            EventKind::RecoverySucceeded => {
                tracing::info!(target: "widgetvisor", unit, attempt = e.attempt, "unit recovered")
            }
            EventKind::RecoveryFailed => {
                tracing::warn!(target: "widgetvisor", unit, attempt = e.attempt, "recovery failed")
            }
            EventKind::UnitPermanentlyFailed => tracing::error!(
                target: "widgetvisor",
                unit,
                attempt = e.attempt,
                "unit permanently failed"
            ),
            EventKind::ForceRecoveryRequested => {
                tracing::info!(target: "widgetvisor", unit, "forced recovery requested")
            }
            EventKind::HistorySwept => {
                tracing::debug!(target: "widgetvisor", removed = e.count, "error history swept")
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "widgetvisor", subscriber = unit, reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "widgetvisor", subscriber = unit, reason, "subscriber panicked")
            }
            EventKind::ShutdownRequested => tracing::info!(target: "widgetvisor", "shutdown requested"),
            EventKind::AllStoppedWithin => {
                tracing::info!(target: "widgetvisor", "all updates stopped within grace")
            }
            EventKind::GraceExceeded => {
                tracing::error!(target: "widgetvisor", stuck = reason, "grace exceeded")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
