//! Isolation and backoff policies.
//!
//! This module groups the knobs that decide **whether** a failing unit is taken
//! out of rotation and **how long** to wait between recovery attempts.
//!
//! ## Contents
//! - [`IsolationPolicy`] rate-window / consecutive-streak thresholds
//! - [`BackoffPolicy`]   how the wait between recovery attempts grows
//! - [`JitterPolicy`]    randomization of that wait
//!
//! ## Quick wiring
//! ```text
//! Config ──► IsolationPolicy::evaluate(history, now) ──► Dashboard isolates
//!        └─► BackoffPolicy { first: isolation_timeout, factor, max: backoff_ceiling }
//!                 └─► RecoveryEngine grows the stored backoff after each failed attempt
//! ```

mod backoff;
pub(crate) mod isolation;
mod jitter;

pub use backoff::BackoffPolicy;
pub use isolation::{IsolationPolicy, IsolationReason, RATE_WINDOW};
pub use jitter::JitterPolicy;
