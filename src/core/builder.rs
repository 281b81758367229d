//! # Dashboard builder.
//!
//! Collects the optional parts of a [`Dashboard`]: event subscribers and
//! recovery strategies beyond the built-ins.

use std::sync::Arc;

use crate::core::config::Config;
use crate::core::dashboard::Dashboard;
use crate::error::{DashboardError, FailureKind};
use crate::events::Bus;
use crate::recovery::{RecoveryEngine, RecoveryStrategy, StrategyRegistry};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for [`Dashboard`].
///
/// ```rust
/// use widgetvisor::{Config, Dashboard, FailureKind, StrategyFn};
///
/// let dash = Dashboard::builder(Config::default())
///     .with_strategy(FailureKind::new("Foo"), StrategyFn::arc("foo", |_u, _c| async { true }))
///     .build()
///     .unwrap();
/// assert!(dash.is_empty());
/// ```
pub struct DashboardBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    strategies: StrategyRegistry,
}

impl DashboardBuilder {
    /// Builder with the built-in strategies and no subscribers.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            strategies: StrategyRegistry::default(),
        }
    }

    /// Sets event subscribers.
    ///
    /// Subscribers run on their own tokio tasks, so a non-empty list requires
    /// [`build`](Self::build) to be called inside a runtime.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Registers (or replaces) the strategy for `kind`.
    pub fn with_strategy(mut self, kind: FailureKind, strategy: Arc<dyn RecoveryStrategy>) -> Self {
        self.strategies.register(kind, strategy);
        self
    }

    /// Replaces the strategy used for kinds without their own.
    pub fn with_fallback_strategy(mut self, strategy: Arc<dyn RecoveryStrategy>) -> Self {
        self.strategies.set_fallback(strategy);
        self
    }

    /// Replaces the whole strategy registry.
    pub fn with_strategies(mut self, strategies: StrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    /// Validates the configuration and builds the dashboard.
    pub fn build(self) -> Result<Dashboard, DashboardError> {
        self.cfg.validate()?;
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let engine = RecoveryEngine::new(
            self.strategies,
            self.cfg.recovery_backoff(),
            self.cfg.max_recovery_attempts,
        );
        Ok(Dashboard::new_internal(self.cfg, bus, engine, subs))
    }
}
