//! # Unit specification for scheduled execution.
//!
//! Defines [`UnitSpec`], the bundle handed to
//! [`Dashboard::register`](crate::Dashboard::register): the unit itself, its id,
//! update interval, priority and initial visibility.
//!
//! A spec can be created:
//! - **Explicitly** with [`UnitSpec::new`]
//! - **Fluently** with [`UnitSpec::builder`]

use std::sync::Arc;
use std::time::Duration;

use crate::error::UpdateError;
use crate::units::{unit::UnitRef, unit_fn::UnitFn};

/// Default update interval used by [`UnitSpecBuilder`].
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Specification for scheduling a unit.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use widgetvisor::{UnitFn, UnitSpec, UpdateError};
///
/// let spec = UnitSpec::new(
///     "clock",
///     UnitFn::arc(|| async { Ok::<_, UpdateError>(()) }),
///     Duration::from_secs(1),
///     10,
/// );
/// assert_eq!(spec.id(), "clock");
/// assert!(spec.visible());
/// ```
#[derive(Clone)]
pub struct UnitSpec {
    id: Arc<str>,
    unit: UnitRef,
    interval: Duration,
    priority: i32,
    visible: bool,
}

impl UnitSpec {
    /// Creates a visible unit specification.
    ///
    /// ### Parameters
    /// - `id`: unique id within the dashboard
    /// - `unit`: update callback and recovery hooks
    /// - `interval`: minimum spacing between two updates (must be non-zero)
    /// - `priority`: higher is dispatched first among simultaneously due units
    pub fn new(id: impl Into<Arc<str>>, unit: UnitRef, interval: Duration, priority: i32) -> Self {
        Self {
            id: id.into(),
            unit,
            interval,
            priority,
            visible: true,
        }
    }

    /// Creates a builder for constructing a spec with a fluent API.
    pub fn builder(id: impl Into<Arc<str>>) -> UnitSpecBuilder {
        UnitSpecBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn shared_id(&self) -> Arc<str> {
        Arc::clone(&self.id)
    }

    pub fn unit(&self) -> &UnitRef {
        &self.unit
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Returns a new spec with the given initial visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Builder for [`UnitSpec`].
#[derive(Clone)]
pub struct UnitSpecBuilder {
    id: Arc<str>,
    interval: Duration,
    priority: i32,
    visible: bool,
}

impl UnitSpecBuilder {
    /// Creates a builder with [`DEFAULT_INTERVAL`], priority 0, visible.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            interval: DEFAULT_INTERVAL,
            priority: 0,
            visible: true,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Registers the unit hidden; it is not dispatched until shown.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Builds the spec from an update closure.
    pub fn build<F, Fut>(self, f: F) -> UnitSpec
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), UpdateError>> + Send + 'static,
    {
        self.build_from_unit(UnitFn::arc(f))
    }

    /// Builds the spec from an existing unit.
    pub fn build_from_unit(self, unit: UnitRef) -> UnitSpec {
        UnitSpec {
            id: self.id,
            unit,
            interval: self.interval,
            priority: self.priority,
            visible: self.visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_and_overrides() {
        let spec = UnitSpec::builder("cpu").build(|| async { Ok::<_, UpdateError>(()) });
        assert_eq!(spec.interval(), DEFAULT_INTERVAL);
        assert_eq!(spec.priority(), 0);
        assert!(spec.visible());

        let spec = UnitSpec::builder("cpu")
            .with_interval(Duration::from_millis(250))
            .with_priority(-3)
            .hidden()
            .build(|| async { Ok::<_, UpdateError>(()) });
        assert_eq!(spec.interval(), Duration::from_millis(250));
        assert_eq!(spec.priority(), -3);
        assert!(!spec.visible());
    }
}
