//! # Dashboard configuration.
//!
//! Provides [`Config`], the centralized settings for one
//! [`Dashboard`](crate::Dashboard) instance. Values are supplied (and usually
//! loaded from a config file) by the caller; [`Config::validate`] rejects the
//! ones the runtime cannot work with.
//!
//! ## Sentinel values
//! - `update_timeout = 0s` → no per-update timeout
//! - `bus_capacity` / `command_capacity` are clamped to a minimum of 1

use std::time::Duration;

use crate::error::DashboardError;
use crate::policies::{BackoffPolicy, IsolationPolicy, JitterPolicy};

/// Configuration for one dashboard instance.
///
/// ## Field groups
/// - **Isolation**: `max_errors_per_minute`, `max_consecutive_errors`
/// - **Recovery**: `isolation_timeout`, `max_recovery_attempts`,
///   `backoff_factor`, `backoff_ceiling`, `jitter`
/// - **Scheduling**: `concurrency_cap`, `update_timeout`, `tick_interval`
/// - **History**: `history_retention`, `sweep_interval`
/// - **Runtime**: `grace`, `bus_capacity`, `command_capacity`
#[derive(Clone, Debug)]
pub struct Config {
    /// Failures within one minute that isolate a unit.
    pub max_errors_per_minute: usize,

    /// Unrecovered failures in a row that isolate a unit.
    pub max_consecutive_errors: usize,

    /// Wait between isolation and the first recovery attempt.
    pub isolation_timeout: Duration,

    /// Failed recovery attempts after which a unit is permanently failed.
    pub max_recovery_attempts: u32,

    /// Maximum number of update operations outstanding at once.
    pub concurrency_cap: usize,

    /// Growth factor of the recovery backoff.
    pub backoff_factor: f64,

    /// Ceiling for the recovery backoff.
    pub backoff_ceiling: Duration,

    /// Jitter applied to recovery waits.
    pub jitter: JitterPolicy,

    /// Per-update timeout (`0s` = none).
    ///
    /// A timed out update fails with a transient error and frees its slot.
    pub update_timeout: Duration,

    /// How long error records are kept.
    pub history_retention: Duration,

    /// How often the retention sweep runs.
    pub sweep_interval: Duration,

    /// Tick period used by [`Dashboard::run`](crate::Dashboard::run).
    pub tick_interval: Duration,

    /// Time [`Dashboard::run`](crate::Dashboard::run) waits for in-flight
    /// updates after a shutdown request.
    pub grace: Duration,

    /// Capacity of the event bus ring buffer.
    pub bus_capacity: usize,

    /// Capacity of the [`DashboardHandle`](crate::DashboardHandle) command queue.
    pub command_capacity: usize,
}

impl Config {
    /// Returns the per-update timeout as an `Option`.
    #[inline]
    pub fn update_timeout(&self) -> Option<Duration> {
        if self.update_timeout == Duration::ZERO {
            None
        } else {
            Some(self.update_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a command queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn command_capacity_clamped(&self) -> usize {
        self.command_capacity.max(1)
    }

    /// Isolation thresholds.
    pub fn isolation_policy(&self) -> IsolationPolicy {
        IsolationPolicy {
            max_errors_per_minute: self.max_errors_per_minute,
            max_consecutive_errors: self.max_consecutive_errors,
        }
    }

    /// Recovery backoff: starts at `isolation_timeout`, grows by
    /// `backoff_factor`, capped at `backoff_ceiling`.
    pub fn recovery_backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            first: self.isolation_timeout,
            max: self.backoff_ceiling.max(self.isolation_timeout),
            factor: self.backoff_factor,
            jitter: self.jitter,
        }
    }

    /// Rejects values the runtime cannot operate with.
    ///
    /// ```
    /// use widgetvisor::Config;
    ///
    /// let mut cfg = Config::default();
    /// assert!(cfg.validate().is_ok());
    /// cfg.concurrency_cap = 0;
    /// assert!(cfg.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), DashboardError> {
        let invalid = |reason: &str| {
            Err(DashboardError::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if self.concurrency_cap == 0 {
            return invalid("concurrency_cap must be at least 1");
        }
        if self.max_errors_per_minute == 0 {
            return invalid("max_errors_per_minute must be at least 1");
        }
        if self.max_consecutive_errors == 0 {
            return invalid("max_consecutive_errors must be at least 1");
        }
        if self.max_recovery_attempts == 0 {
            return invalid("max_recovery_attempts must be at least 1");
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return invalid("backoff_factor must be finite and >= 1.0");
        }
        if self.tick_interval == Duration::ZERO {
            return invalid("tick_interval must be non-zero");
        }
        if self.sweep_interval == Duration::ZERO {
            return invalid("sweep_interval must be non-zero");
        }
        Ok(())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_errors_per_minute = 10`, `max_consecutive_errors = 5`
    /// - `isolation_timeout = 30s`, `max_recovery_attempts = 3`
    /// - `concurrency_cap = 4`
    /// - `backoff_factor = 2.0`, `backoff_ceiling = 5min`, no jitter
    /// - `update_timeout = 0s` (none)
    /// - `history_retention = 24h`, `sweep_interval = 1h`
    /// - `tick_interval = 100ms`, `grace = 5s`
    /// - `bus_capacity = 1024`, `command_capacity = 256`
    fn default() -> Self {
        Self {
            max_errors_per_minute: 10,
            max_consecutive_errors: 5,
            isolation_timeout: Duration::from_secs(30),
            max_recovery_attempts: 3,
            concurrency_cap: 4,
            backoff_factor: 2.0,
            backoff_ceiling: Duration::from_secs(300),
            jitter: JitterPolicy::None,
            update_timeout: Duration::ZERO,
            history_retention: Duration::from_secs(24 * 3600),
            sweep_interval: Duration::from_secs(3600),
            tick_interval: Duration::from_millis(100),
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            command_capacity: 256,
        }
    }
}
