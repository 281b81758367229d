//! # Bounded, time-pruned error history of one unit.
//!
//! ## Rules
//! - At most [`HISTORY_CAPACITY`] records; the oldest is evicted first.
//! - Records are appended in time order and never reordered.
//! - Only the `recovered` flag of a record is ever mutated.
//! - The consecutive streak ends at the newest record flagged `recovered`.

use std::collections::VecDeque;
use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use crate::error::{FailureKind, UpdateError};

/// Maximum number of records kept per unit.
pub const HISTORY_CAPACITY: usize = 100;

/// One recorded failure.
#[derive(Clone, Debug)]
pub struct ErrorRecord {
    /// Monotonic instant the failure was recorded at.
    pub at: Instant,
    /// Wall-clock timestamp, for display.
    pub logged_at: SystemTime,
    /// Human-readable message.
    pub message: String,
    /// Kind tag used for strategy lookup.
    pub kind: FailureKind,
    /// Caller-supplied context for self-reported failures.
    pub context: Option<String>,
    /// Set once the failure is known to be behind the unit.
    pub recovered: bool,
}

/// Per-unit failure log.
#[derive(Clone, Debug, Default)]
pub struct ErrorHistory {
    records: VecDeque<ErrorRecord>,
}

impl ErrorHistory {
    /// Appends a failure, evicting the oldest record beyond capacity.
    pub fn record(&mut self, error: &UpdateError, now: Instant) -> &ErrorRecord {
        self.push(ErrorRecord {
            at: now,
            logged_at: SystemTime::now(),
            message: error.message(),
            kind: error.kind(),
            context: None,
            recovered: false,
        })
    }

    /// Appends a self-reported failure with its context.
    pub fn record_with_context(
        &mut self,
        error: &UpdateError,
        context: impl Into<String>,
        now: Instant,
    ) -> &ErrorRecord {
        let context = context.into();
        self.push(ErrorRecord {
            at: now,
            logged_at: SystemTime::now(),
            message: error.message(),
            kind: error.kind(),
            context: (!context.is_empty()).then_some(context),
            recovered: false,
        })
    }

    fn push(&mut self, record: ErrorRecord) -> &ErrorRecord {
        while self.records.len() >= HISTORY_CAPACITY {
            self.records.pop_front();
        }
        self.records.push_back(record);
        &self.records[self.records.len() - 1]
    }

    /// Drops records older than `retention`. Returns how many were removed.
    pub fn prune(&mut self, now: Instant, retention: Duration) -> usize {
        let before = self.records.len();
        self.records
            .retain(|r| now.saturating_duration_since(r.at) <= retention);
        before - self.records.len()
    }

    /// Unrecovered records at the tail, back to the last recovered one.
    pub fn consecutive_failures(&self) -> usize {
        self.records
            .iter()
            .rev()
            .take_while(|r| !r.recovered)
            .count()
    }

    /// Records inside the trailing `window` ending at `now`.
    pub fn recent_count(&self, now: Instant, window: Duration) -> usize {
        self.records
            .iter()
            .filter(|r| r.at <= now && now.duration_since(r.at) <= window)
            .count()
    }

    /// Flags the newest record as recovered. Returns false if there was
    /// nothing to flag.
    pub fn mark_recovered(&mut self) -> bool {
        match self.records.back_mut() {
            Some(r) if !r.recovered => {
                r.recovered = true;
                true
            }
            _ => false,
        }
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Newest record.
    pub fn latest(&self) -> Option<&ErrorRecord> {
        self.records.back()
    }

    /// Records flagged recovered.
    pub fn recovered_count(&self) -> usize {
        self.records.iter().filter(|r| r.recovered).count()
    }

    /// Oldest-first iterator.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
