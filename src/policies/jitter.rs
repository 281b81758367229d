//! # Jitter policy for recovery waits.
//!
//! [`JitterPolicy`] spreads recovery attempts of units that were isolated at
//! the same moment (e.g. every widget hitting the same dead API), so they do
//! not all retry on the same tick.
//!
//! - [`JitterPolicy::None`] no randomization, predictable waits
//! - [`JitterPolicy::Full`] random wait in [0, base]
//! - [`JitterPolicy::Equal`] base/2 + random[0, base/2]
//! - [`JitterPolicy::Decorrelated`] random[first, base × 3], capped at max

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of recovery waits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Exact backoff wait.
    #[default]
    None,
    /// Random wait in [0, base].
    Full,
    /// base/2 + random[0, base/2].
    Equal,
    /// random[first, base × 3], capped at max. Needs context, see
    /// [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to the given wait.
    ///
    /// `Decorrelated` returns the input unchanged here.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => delay,
            JitterPolicy::Full => full_jitter(delay),
            JitterPolicy::Equal => equal_jitter(delay),
        }
    }

    /// Applies decorrelated jitter with full context.
    ///
    /// Falls back to `apply(prev)` for the other variants.
    pub fn apply_decorrelated(&self, base: Duration, prev: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(prev);
        }

        let base_ms = base.as_millis() as u64;
        let upper = (prev.as_millis() as u64)
            .saturating_mul(3)
            .min(max.as_millis() as u64)
            .max(base_ms);

        if base_ms >= upper {
            return base;
        }
        Duration::from_millis(rand::rng().random_range(base_ms..=upper))
    }
}

fn full_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

fn equal_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    let half = ms / 2;
    if half == 0 {
        return Duration::from_millis(ms);
    }
    Duration::from_millis(half + rand::rng().random_range(0..=half))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d), d);
    }

    #[test]
    fn full_never_exceeds_base() {
        for _ in 0..200 {
            assert!(JitterPolicy::Full.apply(Duration::from_millis(50)) <= Duration::from_millis(50));
        }
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn decorrelated_falls_back_for_other_variants() {
        let d = Duration::from_millis(300);
        assert_eq!(
            JitterPolicy::None.apply_decorrelated(Duration::from_millis(1), d, Duration::from_secs(1)),
            d
        );
    }

    #[test]
    fn decorrelated_returns_base_when_range_is_empty() {
        let base = Duration::from_millis(500);
        let got = JitterPolicy::Decorrelated.apply_decorrelated(
            base,
            Duration::from_millis(100),
            Duration::from_millis(200),
        );
        assert_eq!(got, base);
    }
}
