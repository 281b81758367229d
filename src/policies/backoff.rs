//! # Backoff policy for recovery attempts.
//!
//! [`BackoffPolicy`] controls how the wait between recovery attempts of an
//! isolated unit grows after each failed attempt:
//! - [`BackoffPolicy::first`] the wait before the first attempt (the isolation timeout);
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the ceiling.
//!
//! The base wait after `n` failed attempts is `first × factor^n`, clamped to
//! `max`. The base is what the isolation record stores, so it is monotonically
//! non-decreasing for `factor ≥ 1`; jitter only perturbs the actual sleep and
//! never feeds back into later calculations.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use widgetvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_secs(1),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.base(0), Duration::from_secs(1));
//! assert_eq!(backoff.base(1), Duration::from_secs(2));
//! assert_eq!(backoff.base(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Recovery backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Wait before the first recovery attempt.
    pub first: Duration,
    /// Ceiling for the wait.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` keeps the wait non-decreasing).
    pub factor: f64,
    /// Jitter applied to the actual wait.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 30s`, `factor = 2.0`, `max = 5min`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(30),
            max: Duration::from_secs(300),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Un-jittered wait after `failed_attempts` failed attempts.
    pub fn base(&self, failed_attempts: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = failed_attempts.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Grows a stored base wait by one step, clamped to the ceiling.
    pub fn grow(&self, current: Duration) -> Duration {
        let secs = current.as_secs_f64() * self.factor;
        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Actual wait to schedule for a stored base, with jitter applied.
    pub fn jittered(&self, base: Duration) -> Duration {
        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(first_ms: u64, max_ms: u64, factor: f64, jitter: JitterPolicy) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            factor,
            jitter,
        }
    }

    #[test]
    fn base_doubles_until_ceiling() {
        let p = policy(1000, 10_000, 2.0, JitterPolicy::None);
        assert_eq!(p.base(0), Duration::from_millis(1000));
        assert_eq!(p.base(1), Duration::from_millis(2000));
        assert_eq!(p.base(2), Duration::from_millis(4000));
        assert_eq!(p.base(3), Duration::from_millis(8000));
        assert_eq!(p.base(4), Duration::from_millis(10_000));
    }

    #[test]
    fn grow_matches_base_sequence() {
        let p = policy(1000, 10_000, 2.0, JitterPolicy::None);
        let mut current = p.base(0);
        for n in 1..8 {
            current = p.grow(current);
            assert_eq!(current, p.base(n), "step {n}");
        }
    }

    #[test]
    fn grow_is_monotonic_and_capped() {
        let p = policy(700, 5_000, 2.0, JitterPolicy::None);
        let mut prev = p.first;
        for _ in 0..20 {
            let next = p.grow(prev);
            assert!(next >= prev);
            assert!(next <= p.max);
            prev = next;
        }
        assert_eq!(prev, p.max);
    }

    #[test]
    fn first_above_ceiling_clamps() {
        let p = policy(10_000, 5_000, 2.0, JitterPolicy::None);
        assert_eq!(p.base(0), Duration::from_millis(5_000));
    }

    #[test]
    fn overflow_clamps_to_ceiling() {
        let p = policy(100, 10_000, 2.0, JitterPolicy::None);
        assert_eq!(p.base(u32::MAX), Duration::from_millis(10_000));
        assert_eq!(p.grow(Duration::MAX), Duration::from_millis(10_000));
    }

    #[test]
    fn equal_jitter_stays_within_half_and_base() {
        let p = policy(1000, 30_000, 2.0, JitterPolicy::Equal);
        for n in 0..10 {
            let base = p.base(n);
            let d = p.jittered(base);
            assert!(d >= base / 2, "attempt {n}: {d:?} below half of {base:?}");
            assert!(d <= base, "attempt {n}: {d:?} above {base:?}");
        }
    }

    #[test]
    fn decorrelated_jitter_respects_floor_and_ceiling() {
        let p = policy(100, 30_000, 2.0, JitterPolicy::Decorrelated);
        for _ in 0..100 {
            let d = p.jittered(p.base(6));
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(30_000));
        }
    }
}
