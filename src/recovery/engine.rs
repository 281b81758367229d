//! # Isolation and recovery state machine.
//!
//! [`RecoveryEngine`] owns every transition of a unit's [`Health`]:
//!
//! ```text
//!            isolate(reason)             attempt due
//!   Active ─────────────────► Isolated ──────────────► Recovering
//!     ▲                          ▲  ▲                      │
//!     │     strategy ok          │  │  strategy failed,    │
//!     └──────────────────────────┼──┼──────────────────────┤
//!                                │  └── attempts < max ────┤
//!                     force      │                         │ attempts ≥ max
//!             PermanentlyFailed ─┘◄────────────────────────┘
//! ```
//!
//! The time of the next recovery attempt is the unit's `next_due_at`; the
//! engine writes it and the scheduler reads it against the current state, so
//! an attempt timer left behind by a state change simply never fires.
//!
//! ## Rules
//! - Waits grow by the backoff factor after each failed attempt, up to the ceiling.
//! - A successful attempt clears the unit's history and makes it due at once.
//! - Isolation starts a new epoch; updates dispatched before it are stale.
//! - Strategy panics are failed attempts.
//! - `force` resets the attempt counter and the backoff.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use tokio::time::Instant;

use crate::core::table::UnitRecord;
use crate::error::{DashboardError, FailureKind};
use crate::policies::{BackoffPolicy, IsolationReason};
use crate::recovery::registry::StrategyRegistry;
use crate::recovery::strategy::RecoveryContext;

/// Bookkeeping of an isolated unit.
#[derive(Clone, Debug)]
pub struct IsolationRecord {
    /// When the unit left rotation (or was last forced back into recovery).
    pub isolated_at: Instant,
    /// Failed recovery attempts so far.
    pub attempts: u32,
    /// Un-jittered wait before the next attempt.
    pub backoff: Duration,
    /// Threshold that caused the isolation.
    pub reason: IsolationReason,
}

/// Health of one unit.
#[derive(Clone, Debug)]
pub enum Health {
    /// In rotation.
    Active,
    /// Out of rotation, waiting for the next recovery attempt.
    Isolated(IsolationRecord),
    /// A recovery attempt is running.
    Recovering(IsolationRecord),
    /// Out of attempts; waits for `force_recovery`.
    PermanentlyFailed {
        attempts: u32,
        since: Instant,
        reason: IsolationReason,
    },
}

impl Health {
    pub fn state(&self) -> HealthState {
        match self {
            Health::Active => HealthState::Active,
            Health::Isolated(_) => HealthState::Isolated,
            Health::Recovering(_) => HealthState::Recovering,
            Health::PermanentlyFailed { .. } => HealthState::PermanentlyFailed,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, Health::Active)
    }

    /// Isolation bookkeeping, if the unit is isolated or recovering.
    pub fn isolation(&self) -> Option<&IsolationRecord> {
        match self {
            Health::Isolated(r) | Health::Recovering(r) => Some(r),
            _ => None,
        }
    }

    /// Reason the unit left rotation, if it did.
    pub fn reason(&self) -> Option<IsolationReason> {
        match self {
            Health::Active => None,
            Health::Isolated(r) | Health::Recovering(r) => Some(r.reason),
            Health::PermanentlyFailed { reason, .. } => Some(*reason),
        }
    }

    /// Failed recovery attempts since the last isolation or force.
    pub fn attempts(&self) -> u32 {
        match self {
            Health::Active => 0,
            Health::Isolated(r) | Health::Recovering(r) => r.attempts,
            Health::PermanentlyFailed { attempts, .. } => *attempts,
        }
    }
}

/// Data-free view of [`Health`] for stats and UI placeholders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Active,
    Isolated,
    Recovering,
    PermanentlyFailed,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Active => "active",
            HealthState::Isolated => "isolated",
            HealthState::Recovering => "recovering",
            HealthState::PermanentlyFailed => "permanently_failed",
        }
    }
}

/// A recovery attempt that is ready to run.
pub(crate) struct StartedAttempt {
    /// 1-based attempt number.
    pub attempt: u32,
    pub kind: FailureKind,
    pub strategy: &'static str,
    /// Strategy run with panics mapped to `false`.
    pub future: BoxFuture<'static, bool>,
}

/// Result of asking for a recovery attempt.
pub(crate) enum Begin {
    Started(StartedAttempt),
    /// Attempts were already exhausted; the unit is now permanently failed.
    Exhausted { attempts: u32 },
    /// The unit is not waiting for recovery.
    NotIsolated,
}

/// Result of a finished recovery attempt.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Finish {
    Restored { attempt: u32 },
    Rescheduled { attempts: u32, delay: Duration },
    Exhausted { attempts: u32 },
    /// The unit left `Recovering` while the attempt ran.
    Stale,
}

/// Drives isolation and recovery of unit records.
#[derive(Clone)]
pub(crate) struct RecoveryEngine {
    strategies: StrategyRegistry,
    backoff: BackoffPolicy,
    max_attempts: u32,
}

impl RecoveryEngine {
    pub fn new(strategies: StrategyRegistry, backoff: BackoffPolicy, max_attempts: u32) -> Self {
        Self {
            strategies,
            backoff,
            max_attempts,
        }
    }

    /// Takes an active unit out of rotation and schedules the first attempt.
    ///
    /// Returns the wait before that attempt, or `None` if the unit was
    /// already out of rotation (its reason is refreshed, its timer kept).
    pub fn isolate(
        &self,
        rec: &mut UnitRecord,
        reason: IsolationReason,
        now: Instant,
    ) -> Option<Duration> {
        match &mut rec.health {
            Health::Active => {
                let base = self.backoff.first.min(self.backoff.max);
                let wait = self.backoff.jittered(base);
                rec.health = Health::Isolated(IsolationRecord {
                    isolated_at: now,
                    attempts: 0,
                    backoff: base,
                    reason,
                });
                rec.next_due_at = now + wait;
                rec.verification_pending = false;
                rec.epoch = rec.epoch.wrapping_add(1);
                Some(wait)
            }
            Health::Isolated(r) | Health::Recovering(r) => {
                r.reason = reason;
                None
            }
            Health::PermanentlyFailed { .. } => None,
        }
    }

    /// Moves an isolated unit into `Recovering` and hands back the strategy run.
    pub fn begin(&self, rec: &mut UnitRecord, now: Instant) -> Begin {
        let record = match &rec.health {
            Health::Isolated(r) => r.clone(),
            _ => return Begin::NotIsolated,
        };
        if record.attempts >= self.max_attempts {
            rec.health = Health::PermanentlyFailed {
                attempts: record.attempts,
                since: now,
                reason: record.reason,
            };
            return Begin::Exhausted {
                attempts: record.attempts,
            };
        }

        let latest = rec.errors.latest().cloned();
        let kind = latest
            .as_ref()
            .map(|e| e.kind.clone())
            .unwrap_or(FailureKind::UNCLASSIFIED);
        let strategy = Arc::clone(self.strategies.resolve(&kind));
        let ctx = RecoveryContext {
            unit_id: Arc::clone(&rec.id),
            attempt: record.attempts + 1,
            kind: kind.clone(),
            error: latest,
            isolated_for: now.saturating_duration_since(record.isolated_at),
        };
        let unit = Arc::clone(&rec.unit);
        let name = strategy.name();
        let attempt = ctx.attempt;

        let future = async move {
            AssertUnwindSafe(strategy.recover(unit, &ctx))
                .catch_unwind()
                .await
                .unwrap_or(false)
        }
        .boxed();

        rec.health = Health::Recovering(record);
        Begin::Started(StartedAttempt {
            attempt,
            kind,
            strategy: name,
            future,
        })
    }

    /// Applies the outcome of a recovery attempt.
    pub fn finish(&self, rec: &mut UnitRecord, success: bool, now: Instant) -> Finish {
        let mut record = match &rec.health {
            Health::Recovering(r) => r.clone(),
            _ => return Finish::Stale,
        };

        if success {
            rec.errors.clear();
            rec.health = Health::Active;
            rec.next_due_at = now;
            rec.verification_pending = true;
            rec.counters.recoveries_succeeded += 1;
            return Finish::Restored {
                attempt: record.attempts + 1,
            };
        }

        rec.counters.recoveries_failed += 1;
        record.attempts += 1;
        if record.attempts >= self.max_attempts {
            rec.health = Health::PermanentlyFailed {
                attempts: record.attempts,
                since: now,
                reason: record.reason,
            };
            return Finish::Exhausted {
                attempts: record.attempts,
            };
        }

        record.backoff = self.backoff.grow(record.backoff);
        let delay = self.backoff.jittered(record.backoff);
        rec.next_due_at = now + delay;
        let attempts = record.attempts;
        rec.health = Health::Isolated(record);
        Finish::Rescheduled { attempts, delay }
    }

    /// Makes an isolated or permanently failed unit due for an attempt now,
    /// with a fresh attempt budget.
    pub fn force(&self, rec: &mut UnitRecord, now: Instant) -> Result<(), DashboardError> {
        let first = self.backoff.first.min(self.backoff.max);
        match &mut rec.health {
            Health::Active => {
                return Err(DashboardError::NotIsolated {
                    id: rec.id.to_string(),
                });
            }
            Health::Recovering(_) => {
                return Err(DashboardError::RecoveryInProgress {
                    id: rec.id.to_string(),
                });
            }
            Health::Isolated(r) => {
                r.attempts = 0;
                r.backoff = first;
            }
            Health::PermanentlyFailed { reason, .. } => {
                let reason = *reason;
                rec.health = Health::Isolated(IsolationRecord {
                    isolated_at: now,
                    attempts: 0,
                    backoff: first,
                    reason,
                });
            }
        }
        rec.next_due_at = now;
        Ok(())
    }
}
