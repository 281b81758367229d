//! Runtime core: scheduling, fault handling and lifecycle.
//!
//! The public API from this module is [`Dashboard`] (with its builder, handle
//! and configuration).
//!
//! Internal modules:
//! - [`table`]: generational arena of per-unit records;
//! - [`scheduler`]: picks due units and recovery attempts for a tick;
//! - [`runner`]: wraps updates and recovery attempts, catches panics and timeouts;
//! - [`shutdown`]: termination signal handling.

mod builder;
mod config;
mod dashboard;
mod handle;
pub(crate) mod runner;
pub(crate) mod scheduler;
mod shutdown;
pub(crate) mod table;

pub use builder::DashboardBuilder;
pub use config::Config;
pub use dashboard::{Dashboard, TickReport};
pub use handle::DashboardHandle;
