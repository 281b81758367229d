//! # widgetvisor
//!
//! **Widgetvisor** schedules periodic updates for the widgets of a terminal
//! dashboard and keeps a misbehaving widget from taking the others down.
//!
//! Every widget is a [`Unit`] with an update interval and a priority. A host
//! loop calls [`Dashboard::tick`] (or lets [`Dashboard::run`] do it); each tick
//! dispatches the due, visible units in priority order under a global
//! concurrency cap. Failures are recorded per unit. A unit that fails too
//! often is isolated and retried through a pluggable [`RecoveryStrategy`]
//! with growing backoff, and parked as permanently failed once its attempts
//! run out.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   UnitSpec   │   │   UnitSpec   │   │   UnitSpec   │
//!     │  (clock, 1s) │   │ (weather,60s)│   │  (cpu, 2s)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Dashboard                                                        │
//! │  - UnitTable (one record per unit: schedule, errors, health)      │
//! │  - scheduler (priority ↓, due ↑, registration ↑, concurrency cap) │
//! │  - IsolationPolicy (rate window / consecutive streak)              │
//! │  - RecoveryEngine (StrategyRegistry, backoff, attempt budget)     │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │ unit.update()│   │ unit.update()│   │  strategy    │   │
//!     │  (in flight) │   │  (in flight) │   │  .recover()  │   │
//!     └──────────────┘   └──────────────┘   └──────────────┘   │
//!                                                              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │    event listener      │
//!                       │    (in Dashboard)      │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                     LogWriter  status bar  custom
//! ```
//!
//! ### Unit lifecycle
//! ```text
//! register ──► Active ──(errors/min ≥ max or streak ≥ max)──► Isolated
//!                ▲                                              │ isolation_timeout
//!                │ strategy ok: history cleared,                ▼
//!                │ one verification update              Recovering
//!                └──────────────────────────────────────────────┤
//!                                    strategy failed:           │
//!                    Isolated ◄── backoff × factor (≤ ceiling) ─┤
//!                                                               │ attempts ≥ max
//!                    force_recovery ◄── PermanentlyFailed ◄─────┘
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Units**         | Widgets as update closures or trait impls with recovery hooks.  | [`Unit`], [`UnitFn`], [`UnitSpec`]          |
//! | **Scheduling**    | Tick-driven dispatch with priorities and a concurrency cap.     | [`Dashboard`], [`TickReport`]               |
//! | **Isolation**     | Rate-window and streak thresholds per unit.                     | [`IsolationPolicy`], [`ErrorHistory`]       |
//! | **Recovery**      | Kind-keyed strategies with fallback and growing backoff.        | [`RecoveryStrategy`], [`StrategyRegistry`]  |
//! | **Stats**         | Per-unit and system-wide snapshots for status views.            | [`UnitStats`], [`SystemStats`]              |
//! | **Subscriber API**| Hook into scheduling and fault events.                          | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors for the API and for unit updates.                  | [`DashboardError`], [`UpdateError`]         |
//! | **Configuration** | Centralized thresholds and timings.                             | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging` _(default)_: exports [`LogWriter`], a subscriber forwarding events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use widgetvisor::{Config, Dashboard, UnitSpec, UpdateError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         max_consecutive_errors: 3,
//!         ..Config::default()
//!     };
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn widgetvisor::Subscribe>> = vec![Arc::new(widgetvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn widgetvisor::Subscribe>> = Vec::new();
//!
//!     let mut dash = Dashboard::builder(cfg).with_subscribers(subs).build()?;
//!
//!     dash.register(
//!         UnitSpec::builder("weather")
//!             .with_interval(Duration::from_millis(10))
//!             .build(|| async { Err::<(), _>(UpdateError::transient("dns lookup failed")) }),
//!     )?;
//!
//!     let mut now = Instant::now();
//!     for _ in 0..3 {
//!         dash.tick(now);
//!         now += Duration::from_millis(10);
//!     }
//!     assert!(dash.is_isolated("weather"));
//!
//!     dash.shutdown().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod recovery;
mod stats;
mod subscribers;
mod tracker;
mod units;

// ---- Public re-exports ----

pub use core::{Config, Dashboard, DashboardBuilder, DashboardHandle, TickReport};
pub use error::{DashboardError, FailureKind, HandleError, UpdateError};
pub use events::{Event, EventKind};
pub use policies::{BackoffPolicy, IsolationPolicy, IsolationReason, JitterPolicy, RATE_WINDOW};
pub use recovery::{
    ConfigurationRecovery, Health, HealthState, IsolationRecord, RecoveryContext,
    RecoveryStrategy, ResetRecovery, ResourceRecovery, StrategyFn, StrategyRegistry,
    TransientRecovery,
};
pub use stats::{LastError, SystemStats, UnitStats};
pub use subscribers::Subscribe;
pub use tracker::{ErrorHistory, ErrorRecord, HISTORY_CAPACITY};
pub use units::{BoxUpdateFuture, DEFAULT_INTERVAL, Unit, UnitFn, UnitRef, UnitSpec, UnitSpecBuilder};

// Optional: expose a built-in logger subscriber.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
