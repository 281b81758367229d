//! # Event subscribers for the dashboard runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Dashboard ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                        ├──► LogWriter (tracing)
//!                                                        ├──► status bar
//!                                                        └──► custom ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_message;
