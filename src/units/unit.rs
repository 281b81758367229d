//! # Unit abstraction.
//!
//! A [`Unit`] is the widget-side half of a scheduled update: it produces a
//! fresh future per update and exposes optional hooks the recovery strategies
//! call while the unit is isolated. The common handle type is [`UnitRef`].
//!
//! Futures are `'static` and owned: a unit that needs shared state across
//! updates keeps it behind an `Arc` it clones into each future.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::UpdateError;

/// Boxed future returned by [`Unit`] methods.
pub type BoxUpdateFuture = Pin<Box<dyn Future<Output = Result<(), UpdateError>> + Send + 'static>>;

/// Shared handle to a unit.
pub type UnitRef = Arc<dyn Unit>;

/// # Periodically updated widget.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use widgetvisor::{BoxUpdateFuture, Unit, UpdateError};
///
/// struct Counter(Arc<AtomicU64>);
///
/// impl Unit for Counter {
///     fn update(&self) -> BoxUpdateFuture {
///         let n = self.0.clone();
///         Box::pin(async move {
///             n.fetch_add(1, Ordering::Relaxed);
///             Ok::<(), UpdateError>(())
///         })
///     }
/// }
/// ```
pub trait Unit: Send + Sync + 'static {
    /// Produces one update.
    fn update(&self) -> BoxUpdateFuture;

    /// Drops transient state and re-initializes. Default: no-op.
    fn reset(&self) -> BoxUpdateFuture {
        ready(Ok(()))
    }

    /// Releases caches held by the unit. Default: no-op.
    fn clear_caches(&self) -> BoxUpdateFuture {
        ready(Ok(()))
    }

    /// Re-checks the unit's configuration. Default: fails, since a unit that
    /// cannot revalidate cannot prove a configuration problem went away.
    fn revalidate(&self) -> BoxUpdateFuture {
        ready(Err(UpdateError::configuration("revalidation not supported")))
    }
}

pub(crate) fn ready(result: Result<(), UpdateError>) -> BoxUpdateFuture {
    Box::pin(std::future::ready(result))
}
