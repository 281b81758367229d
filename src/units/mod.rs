//! # Unit abstractions and specifications.
//!
//! - [`Unit`] trait for widgets producing async updates (plus recovery hooks)
//! - [`UnitFn`] closure-backed implementation
//! - [`UnitRef`] shared handle (`Arc<dyn Unit>`)
//! - [`UnitSpec`] unit + id + interval + priority + visibility

mod spec;
mod unit;
mod unit_fn;

pub use spec::{DEFAULT_INTERVAL, UnitSpec, UnitSpecBuilder};
pub use unit::{BoxUpdateFuture, Unit, UnitRef};
pub use unit_fn::UnitFn;
