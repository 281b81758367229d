//! # Error statistics.
//!
//! Read-only snapshots for status bars and operator views:
//! [`UnitStats`] for one unit and [`SystemStats`] for the whole dashboard.
//! Both serialize with serde, so they can be dumped as JSON by the host.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tokio::time::Instant;

use crate::core::table::{UnitRecord, UnitTable};
use crate::error::FailureKind;
use crate::policies::{IsolationReason, RATE_WINDOW};
use crate::recovery::{Health, HealthState};

/// Most recent failure of a unit.
#[derive(Clone, Debug, Serialize)]
pub struct LastError {
    pub kind: FailureKind,
    pub message: String,
    pub context: Option<String>,
    pub logged_at: SystemTime,
    pub recovered: bool,
}

/// Snapshot of one unit.
#[derive(Clone, Debug, Serialize)]
pub struct UnitStats {
    pub id: String,
    pub health: HealthState,
    /// True unless the unit is active.
    pub isolated: bool,
    pub visible: bool,
    pub in_flight: bool,
    pub priority: i32,
    pub interval: Duration,
    /// Time since the last dispatched update.
    pub last_run_ago: Option<Duration>,

    /// Records currently in the history.
    pub total_errors: usize,
    /// Records inside the trailing minute.
    pub recent_errors: usize,
    pub consecutive_errors: usize,
    /// Records flagged recovered.
    pub recovered_errors: usize,
    pub last_error: Option<LastError>,

    pub updates_succeeded: u64,
    pub updates_failed: u64,
    /// Failures recorded since registration, including pruned ones.
    pub lifetime_errors: u64,

    /// Failed recovery attempts since the last isolation or force.
    pub recovery_attempts: u32,
    pub recoveries_succeeded: u64,
    pub recoveries_failed: u64,
    /// Share of successful recovery attempts; `None` before the first attempt.
    pub recovery_rate: Option<f64>,

    pub isolation_reason: Option<IsolationReason>,
    /// Time spent out of rotation.
    pub isolated_for: Option<Duration>,
    /// Time until the next update (active) or recovery attempt (isolated).
    pub next_due_in: Option<Duration>,
}

/// Snapshot of the whole dashboard.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SystemStats {
    pub total_units: usize,
    pub active: usize,
    pub isolated: usize,
    pub recovering: usize,
    pub permanently_failed: usize,
    pub hidden: usize,
    /// Outstanding update operations, including those of unregistered units.
    pub in_flight: usize,

    pub total_errors: usize,
    pub recent_errors: usize,
    /// History records by failure kind.
    pub errors_by_kind: BTreeMap<String, usize>,

    pub recoveries_succeeded: u64,
    pub recoveries_failed: u64,
    pub recovery_rate: Option<f64>,

    /// Ids of units out of rotation (isolated, recovering or failed), sorted.
    pub isolated_units: Vec<String>,
    /// Ids of permanently failed units, sorted.
    pub failed_units: Vec<String>,
}

fn rate(succeeded: u64, failed: u64) -> Option<f64> {
    let total = succeeded + failed;
    (total > 0).then(|| succeeded as f64 / total as f64)
}

pub(crate) fn unit_stats(rec: &UnitRecord, now: Instant) -> UnitStats {
    let state = rec.health.state();
    let isolated_for = match &rec.health {
        Health::Active => None,
        Health::Isolated(r) | Health::Recovering(r) => {
            Some(now.saturating_duration_since(r.isolated_at))
        }
        Health::PermanentlyFailed { since, .. } => Some(now.saturating_duration_since(*since)),
    };
    let next_due_in = match state {
        HealthState::Active | HealthState::Isolated => {
            Some(rec.next_due_at.saturating_duration_since(now))
        }
        HealthState::Recovering | HealthState::PermanentlyFailed => None,
    };

    UnitStats {
        id: rec.id.to_string(),
        health: state,
        isolated: !rec.health.is_active(),
        visible: rec.visible,
        in_flight: rec.in_flight,
        priority: rec.priority,
        interval: rec.interval,
        last_run_ago: rec
            .last_run_at
            .map(|at| now.saturating_duration_since(at)),
        total_errors: rec.errors.len(),
        recent_errors: rec.errors.recent_count(now, RATE_WINDOW),
        consecutive_errors: rec.errors.consecutive_failures(),
        recovered_errors: rec.errors.recovered_count(),
        last_error: rec.errors.latest().map(|e| LastError {
            kind: e.kind.clone(),
            message: e.message.clone(),
            context: e.context.clone(),
            logged_at: e.logged_at,
            recovered: e.recovered,
        }),
        updates_succeeded: rec.counters.updates_succeeded,
        updates_failed: rec.counters.updates_failed,
        lifetime_errors: rec.counters.errors_recorded,
        recovery_attempts: rec.health.attempts(),
        recoveries_succeeded: rec.counters.recoveries_succeeded,
        recoveries_failed: rec.counters.recoveries_failed,
        recovery_rate: rate(
            rec.counters.recoveries_succeeded,
            rec.counters.recoveries_failed,
        ),
        isolation_reason: rec.health.reason(),
        isolated_for,
        next_due_in,
    }
}

pub(crate) fn system_stats(table: &UnitTable, in_flight: usize, now: Instant) -> SystemStats {
    let mut out = SystemStats {
        in_flight,
        ..SystemStats::default()
    };

    for (_, rec) in table.iter() {
        out.total_units += 1;
        match rec.health.state() {
            HealthState::Active => out.active += 1,
            HealthState::Isolated => out.isolated += 1,
            HealthState::Recovering => out.recovering += 1,
            HealthState::PermanentlyFailed => {
                out.permanently_failed += 1;
                out.failed_units.push(rec.id.to_string());
            }
        }
        if !rec.health.is_active() {
            out.isolated_units.push(rec.id.to_string());
        }
        if !rec.visible {
            out.hidden += 1;
        }
        out.total_errors += rec.errors.len();
        out.recent_errors += rec.errors.recent_count(now, RATE_WINDOW);
        for e in rec.errors.iter() {
            *out.errors_by_kind.entry(e.kind.to_string()).or_default() += 1;
        }
        out.recoveries_succeeded += rec.counters.recoveries_succeeded;
        out.recoveries_failed += rec.counters.recoveries_failed;
    }

    out.recovery_rate = rate(out.recoveries_succeeded, out.recoveries_failed);
    out.isolated_units.sort();
    out.failed_units.sort();
    out
}
