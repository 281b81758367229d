//! # Function-backed unit (`UnitFn`)
//!
//! [`UnitFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future per
//! update. Recovery hooks are optional closures of the same shape.
//!
//! ## Example
//! ```rust
//! use widgetvisor::{UnitFn, UnitRef, UpdateError};
//!
//! let clock: UnitRef = UnitFn::new(|| async { Ok::<_, UpdateError>(()) })
//!     .with_reset(|| async { Ok::<_, UpdateError>(()) })
//!     .into_ref();
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::error::UpdateError;
use crate::units::unit::{BoxUpdateFuture, Unit, UnitRef};

type Hook = Arc<dyn Fn() -> BoxUpdateFuture + Send + Sync>;

fn hook<H, Fut>(h: H) -> Hook
where
    H: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UpdateError>> + Send + 'static,
{
    Arc::new(move || Box::pin(h()) as BoxUpdateFuture)
}

/// Function-backed unit implementation.
pub struct UnitFn<F> {
    f: F,
    reset: Option<Hook>,
    clear_caches: Option<Hook>,
    revalidate: Option<Hook>,
}

impl<F, Fut> UnitFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UpdateError>> + Send + 'static,
{
    /// Creates a unit from its update closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            reset: None,
            clear_caches: None,
            revalidate: None,
        }
    }

    /// Creates the unit and returns it as a shared handle.
    pub fn arc(f: F) -> UnitRef {
        Arc::new(Self::new(f))
    }

    /// Sets the hook used by the reset-based recovery strategies.
    pub fn with_reset<H, HFut>(mut self, h: H) -> Self
    where
        H: Fn() -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<(), UpdateError>> + Send + 'static,
    {
        self.reset = Some(hook(h));
        self
    }

    /// Sets the hook used by the resource strategy.
    pub fn with_clear_caches<H, HFut>(mut self, h: H) -> Self
    where
        H: Fn() -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<(), UpdateError>> + Send + 'static,
    {
        self.clear_caches = Some(hook(h));
        self
    }

    /// Sets the hook used by the configuration strategy.
    pub fn with_revalidate<H, HFut>(mut self, h: H) -> Self
    where
        H: Fn() -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<(), UpdateError>> + Send + 'static,
    {
        self.revalidate = Some(hook(h));
        self
    }

    /// Finishes the builder chain.
    pub fn into_ref(self) -> UnitRef {
        Arc::new(self)
    }
}

impl<F, Fut> Unit for UnitFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UpdateError>> + Send + 'static,
{
    fn update(&self) -> BoxUpdateFuture {
        Box::pin((self.f)())
    }

    fn reset(&self) -> BoxUpdateFuture {
        match &self.reset {
            Some(h) => h(),
            None => crate::units::unit::ready(Ok(())),
        }
    }

    fn clear_caches(&self) -> BoxUpdateFuture {
        match &self.clear_caches {
            Some(h) => h(),
            None => crate::units::unit::ready(Ok(())),
        }
    }

    fn revalidate(&self) -> BoxUpdateFuture {
        match &self.revalidate {
            Some(h) => h(),
            None => crate::units::unit::ready(Err(UpdateError::configuration(
                "revalidation not supported",
            ))),
        }
    }
}
