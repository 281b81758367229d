//! # Recovery strategies.
//!
//! A [`RecoveryStrategy`] is a remediation routine run while a unit is
//! isolated. It receives the unit and a [`RecoveryContext`] describing the
//! failure and returns whether the unit is healthy again.
//!
//! Built-ins, one per failure kind:
//!
//! | Kind            | Strategy                  | Action                                   |
//! |-----------------|---------------------------|------------------------------------------|
//! | `transient`     | [`TransientRecovery`]     | let the fault settle, then `reset()`     |
//! | `resource`      | [`ResourceRecovery`]      | `clear_caches()`                         |
//! | `configuration` | [`ConfigurationRecovery`] | succeed only if `revalidate()` passes    |
//! | `unclassified`  | [`ResetRecovery`]         | `reset()` (also the default fallback)    |

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FailureKind;
use crate::tracker::ErrorRecord;
use crate::units::UnitRef;

/// What a strategy knows about the failure it is remediating.
#[derive(Clone, Debug)]
pub struct RecoveryContext {
    /// Unit id.
    pub unit_id: Arc<str>,
    /// 1-based number of this attempt since isolation (or forced recovery).
    pub attempt: u32,
    /// Kind used for the strategy lookup.
    pub kind: FailureKind,
    /// Most recent error of the unit, if any is still on record.
    pub error: Option<ErrorRecord>,
    /// Time spent isolated so far.
    pub isolated_for: Duration,
}

/// Pluggable remediation routine, selected by [`FailureKind`].
///
/// Panics inside `recover` are caught and count as a failed attempt.
#[async_trait]
pub trait RecoveryStrategy: Send + Sync + 'static {
    /// Short name used in events and logs.
    fn name(&self) -> &'static str;

    /// Attempts to heal `unit`. Returns `true` when it can rejoin rotation.
    async fn recover(&self, unit: UnitRef, ctx: &RecoveryContext) -> bool;
}

/// Waits for the fault to settle, then resets the unit's transient state.
#[derive(Clone, Copy, Debug)]
pub struct TransientRecovery {
    /// Pause before resetting.
    pub settle: Duration,
}

impl Default for TransientRecovery {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(250),
        }
    }
}

#[async_trait]
impl RecoveryStrategy for TransientRecovery {
    fn name(&self) -> &'static str {
        "transient"
    }

    async fn recover(&self, unit: UnitRef, _ctx: &RecoveryContext) -> bool {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        unit.reset().await.is_ok()
    }
}

/// Clears the unit's caches.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResourceRecovery;

#[async_trait]
impl RecoveryStrategy for ResourceRecovery {
    fn name(&self) -> &'static str {
        "resource"
    }

    async fn recover(&self, unit: UnitRef, _ctx: &RecoveryContext) -> bool {
        unit.clear_caches().await.is_ok()
    }
}

/// Succeeds only if the unit's configuration now revalidates.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfigurationRecovery;

#[async_trait]
impl RecoveryStrategy for ConfigurationRecovery {
    fn name(&self) -> &'static str {
        "configuration"
    }

    async fn recover(&self, unit: UnitRef, _ctx: &RecoveryContext) -> bool {
        unit.revalidate().await.is_ok()
    }
}

/// Resets and re-initializes the unit. Default fallback.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResetRecovery;

#[async_trait]
impl RecoveryStrategy for ResetRecovery {
    fn name(&self) -> &'static str {
        "reset"
    }

    async fn recover(&self, unit: UnitRef, _ctx: &RecoveryContext) -> bool {
        unit.reset().await.is_ok()
    }
}

/// Closure-backed strategy.
///
/// ```rust
/// use std::sync::Arc;
/// use widgetvisor::{RecoveryStrategy, StrategyFn};
///
/// let always: Arc<dyn RecoveryStrategy> = StrategyFn::arc("always", |_unit, _ctx| async { true });
/// assert_eq!(always.name(), "always");
/// ```
pub struct StrategyFn<F> {
    name: &'static str,
    f: F,
}

impl<F, Fut> StrategyFn<F>
where
    F: Fn(UnitRef, RecoveryContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }

    pub fn arc(name: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> RecoveryStrategy for StrategyFn<F>
where
    F: Fn(UnitRef, RecoveryContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn recover(&self, unit: UnitRef, ctx: &RecoveryContext) -> bool {
        (self.f)(unit, ctx.clone()).await
    }
}
