//! # Recovery of isolated units.
//!
//! - [`RecoveryStrategy`] pluggable remediation, keyed by [`FailureKind`](crate::FailureKind)
//! - [`StrategyRegistry`] lookup with an explicit fallback
//! - [`Health`] / [`HealthState`] per-unit lifecycle
//! - `RecoveryEngine` (crate-internal) the transitions between health states

mod engine;
mod registry;
mod strategy;

pub(crate) use engine::{Begin, Finish, RecoveryEngine};
pub use engine::{Health, HealthState, IsolationRecord};
pub use registry::StrategyRegistry;
pub use strategy::{
    ConfigurationRecovery, RecoveryContext, RecoveryStrategy, ResetRecovery, ResourceRecovery,
    StrategyFn, TransientRecovery,
};
