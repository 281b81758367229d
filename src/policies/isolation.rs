//! # Isolation policy.
//!
//! [`IsolationPolicy`] decides whether a unit's recent failures warrant taking
//! it out of rotation. It is a pure function of an [`ErrorHistory`] and the
//! current instant:
//!
//! ```text
//! isolate ⇔ recent_count(60s) ≥ max_errors_per_minute
//!         ∨ consecutive_failures ≥ max_consecutive_errors
//! ```
//!
//! A successful update only resets the consecutive streak; failures inside the
//! rate window keep counting until they age out.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::tracker::ErrorHistory;

/// Length of the rate window.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Which threshold tripped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "threshold", rename_all = "snake_case")]
pub enum IsolationReason {
    /// Too many failures inside [`RATE_WINDOW`].
    ErrorRate {
        /// Failures counted in the window.
        count: usize,
    },
    /// Too many failures in a row.
    ConsecutiveFailures {
        /// Length of the streak.
        count: usize,
    },
    /// Isolated directly through [`Dashboard::isolate`](crate::Dashboard::isolate).
    Manual,
}

impl fmt::Display for IsolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationReason::ErrorRate { count } => write!(f, "{count} failures within a minute"),
            IsolationReason::ConsecutiveFailures { count } => {
                write!(f, "{count} consecutive failures")
            }
            IsolationReason::Manual => f.write_str("isolated by operator"),
        }
    }
}

/// Thresholds for taking a unit out of rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IsolationPolicy {
    /// Failures within the trailing minute that trigger isolation.
    pub max_errors_per_minute: usize,
    /// Unrecovered failures in a row that trigger isolation.
    pub max_consecutive_errors: usize,
}

impl Default for IsolationPolicy {
    fn default() -> Self {
        Self {
            max_errors_per_minute: 10,
            max_consecutive_errors: 5,
        }
    }
}

impl IsolationPolicy {
    /// Returns the tripped threshold, if any. The rate window is checked first.
    pub fn evaluate(&self, history: &ErrorHistory, now: Instant) -> Option<IsolationReason> {
        let recent = history.recent_count(now, RATE_WINDOW);
        if recent >= self.max_errors_per_minute {
            return Some(IsolationReason::ErrorRate { count: recent });
        }
        let streak = history.consecutive_failures();
        if streak >= self.max_consecutive_errors {
            return Some(IsolationReason::ConsecutiveFailures { count: streak });
        }
        None
    }

    /// Boolean form of [`evaluate`](Self::evaluate).
    #[inline]
    pub fn should_isolate(&self, history: &ErrorHistory, now: Instant) -> bool {
        self.evaluate(history, now).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpdateError;

    fn policy(rate: usize, streak: usize) -> IsolationPolicy {
        IsolationPolicy {
            max_errors_per_minute: rate,
            max_consecutive_errors: streak,
        }
    }

    #[test]
    fn streak_trips_exactly_at_threshold() {
        let p = policy(100, 3);
        let t0 = Instant::now();
        let mut h = ErrorHistory::default();

        h.record(&UpdateError::failed("1"), t0);
        h.record(&UpdateError::failed("2"), t0 + Duration::from_secs(1));
        assert!(!p.should_isolate(&h, t0 + Duration::from_secs(1)));

        h.record(&UpdateError::failed("3"), t0 + Duration::from_secs(2));
        assert_eq!(
            p.evaluate(&h, t0 + Duration::from_secs(2)),
            Some(IsolationReason::ConsecutiveFailures { count: 3 })
        );
    }

    #[test]
    fn rate_window_trips_on_fifth_failure_within_ten_seconds() {
        let p = policy(5, 100);
        let t0 = Instant::now();
        let mut h = ErrorHistory::default();
        for i in 0..4u64 {
            h.record(&UpdateError::failed("x"), t0 + Duration::from_secs(2 * i));
            assert!(!p.should_isolate(&h, t0 + Duration::from_secs(2 * i)));
        }
        h.record(&UpdateError::failed("x"), t0 + Duration::from_secs(9));
        assert_eq!(
            p.evaluate(&h, t0 + Duration::from_secs(9)),
            Some(IsolationReason::ErrorRate { count: 5 })
        );
    }

    #[test]
    fn success_resets_streak_but_not_rate_window() {
        let p = policy(4, 3);
        let t0 = Instant::now();
        let mut h = ErrorHistory::default();

        h.record(&UpdateError::failed("a"), t0);
        h.record(&UpdateError::failed("b"), t0);
        h.mark_recovered();
        assert_eq!(h.consecutive_failures(), 0);

        h.record(&UpdateError::failed("c"), t0);
        assert_eq!(h.consecutive_failures(), 1);
        assert_eq!(h.recent_count(t0, RATE_WINDOW), 3);
        assert!(!p.should_isolate(&h, t0));

        h.record(&UpdateError::failed("d"), t0);
        assert_eq!(
            p.evaluate(&h, t0),
            Some(IsolationReason::ErrorRate { count: 4 })
        );
    }

    #[test]
    fn old_failures_age_out_of_rate_window() {
        let p = policy(3, 100);
        let t0 = Instant::now();
        let mut h = ErrorHistory::default();
        h.record(&UpdateError::failed("a"), t0);
        h.record(&UpdateError::failed("b"), t0);
        h.record(&UpdateError::failed("c"), t0 + Duration::from_secs(61));
        assert!(!p.should_isolate(&h, t0 + Duration::from_secs(61)));
    }

    #[test]
    fn empty_history_never_isolates() {
        assert!(!policy(1, 1).should_isolate(&ErrorHistory::default(), Instant::now()));
    }
}
