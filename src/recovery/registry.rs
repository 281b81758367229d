//! # Kind-keyed strategy registry.
//!
//! Maps a [`FailureKind`] to a [`RecoveryStrategy`]. Lookups never fail:
//! unknown kinds resolve to the explicit fallback.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::FailureKind;
use crate::recovery::strategy::{
    ConfigurationRecovery, RecoveryStrategy, ResetRecovery, ResourceRecovery, TransientRecovery,
};

/// Registry of recovery strategies with a fallback.
#[derive(Clone)]
pub struct StrategyRegistry {
    by_kind: HashMap<FailureKind, Arc<dyn RecoveryStrategy>>,
    fallback: Arc<dyn RecoveryStrategy>,
}

impl Default for StrategyRegistry {
    /// Built-in strategy per well-known kind, [`ResetRecovery`] as fallback.
    fn default() -> Self {
        let mut reg = Self::with_fallback(Arc::new(ResetRecovery));
        reg.register(FailureKind::TRANSIENT, Arc::new(TransientRecovery::default()));
        reg.register(FailureKind::RESOURCE, Arc::new(ResourceRecovery));
        reg.register(FailureKind::CONFIGURATION, Arc::new(ConfigurationRecovery));
        reg.register(FailureKind::UNCLASSIFIED, Arc::new(ResetRecovery));
        reg
    }
}

impl StrategyRegistry {
    /// Empty registry: every kind resolves to `fallback`.
    pub fn with_fallback(fallback: Arc<dyn RecoveryStrategy>) -> Self {
        Self {
            by_kind: HashMap::new(),
            fallback,
        }
    }

    /// Registers a strategy for `kind`, returning the one it replaced.
    pub fn register(
        &mut self,
        kind: FailureKind,
        strategy: Arc<dyn RecoveryStrategy>,
    ) -> Option<Arc<dyn RecoveryStrategy>> {
        self.by_kind.insert(kind, strategy)
    }

    /// Replaces the fallback.
    pub fn set_fallback(&mut self, fallback: Arc<dyn RecoveryStrategy>) {
        self.fallback = fallback;
    }

    /// Strategy for `kind`, or the fallback.
    pub fn resolve(&self, kind: &FailureKind) -> &Arc<dyn RecoveryStrategy> {
        self.by_kind.get(kind).unwrap_or(&self.fallback)
    }

    /// True if `kind` has its own strategy.
    pub fn contains(&self, kind: &FailureKind) -> bool {
        self.by_kind.contains_key(kind)
    }
}
