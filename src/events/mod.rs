//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the dashboard while it schedules,
//! isolates and recovers units.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Dashboard` (registration, dispatch, completion, isolation,
//!   recovery), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the dashboard's subscriber listener, which fans out to
//!   the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
