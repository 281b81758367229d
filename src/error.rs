//! Error types used by the widgetvisor runtime and by widget units.
//!
//! This module defines:
//!
//! - [`DashboardError`] errors raised by the dashboard API itself.
//! - [`UpdateError`] failures of individual unit updates, tagged with a [`FailureKind`].
//! - [`HandleError`] failures of the [`DashboardHandle`](crate::DashboardHandle) command queue.
//!
//! All types provide `as_label` for logs/metrics.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Tag classifying a failure; used to look up a recovery strategy.
///
/// Four well-known tags ship with the crate. Any other tag is legal and resolves
/// to the fallback strategy unless a strategy is registered for it.
///
/// ```rust
/// use widgetvisor::FailureKind;
///
/// let custom = FailureKind::new("Foo");
/// assert_eq!(custom.as_str(), "Foo");
/// assert_ne!(custom, FailureKind::UNCLASSIFIED);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FailureKind(Cow<'static, str>);

impl FailureKind {
    /// Network/timeout-like failures that usually clear on their own.
    pub const TRANSIENT: FailureKind = FailureKind(Cow::Borrowed("transient"));
    /// Memory or cache pressure.
    pub const RESOURCE: FailureKind = FailureKind(Cow::Borrowed("resource"));
    /// Invalid widget configuration; rarely auto-recoverable.
    pub const CONFIGURATION: FailureKind = FailureKind(Cow::Borrowed("configuration"));
    /// Anything else.
    pub const UNCLASSIFIED: FailureKind = FailureKind(Cow::Borrowed("unclassified"));

    /// Creates a kind from an arbitrary tag.
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// # Errors produced by the dashboard API.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A unit with the same id is already registered.
    #[error("unit '{id}' is already registered")]
    DuplicateUnit {
        /// Offending id.
        id: String,
    },

    /// No unit with this id is registered.
    #[error("unit '{id}' is not registered")]
    UnitNotFound {
        /// Requested id.
        id: String,
    },

    /// The unit was registered with a zero update interval.
    #[error("unit '{id}' has a zero update interval")]
    InvalidInterval {
        /// Offending id.
        id: String,
    },

    /// `force_recovery` was called on a unit that is active.
    #[error("unit '{id}' is not isolated")]
    NotIsolated {
        /// Requested id.
        id: String,
    },

    /// `force_recovery` was called while a recovery attempt is outstanding.
    #[error("unit '{id}' has a recovery attempt in flight")]
    RecoveryInProgress {
        /// Requested id.
        id: String,
    },

    /// Configuration rejected by [`Config::validate`](crate::Config::validate).
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },

    /// Shutdown grace period was exceeded; some updates were still outstanding.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Sorted ids of units with an update or recovery attempt still
        /// running, unregistered units included.
        stuck: Vec<String>,
    },
}

impl DashboardError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use widgetvisor::DashboardError;
    ///
    /// let err = DashboardError::UnitNotFound { id: "clock".into() };
    /// assert_eq!(err.as_label(), "unit_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DashboardError::DuplicateUnit { .. } => "duplicate_unit",
            DashboardError::UnitNotFound { .. } => "unit_not_found",
            DashboardError::InvalidInterval { .. } => "invalid_interval",
            DashboardError::NotIsolated { .. } => "not_isolated",
            DashboardError::RecoveryInProgress { .. } => "recovery_in_progress",
            DashboardError::InvalidConfig { .. } => "invalid_config",
            DashboardError::GraceExceeded { .. } => "grace_exceeded",
        }
    }

    pub(crate) fn not_found(id: &str) -> Self {
        DashboardError::UnitNotFound { id: id.to_string() }
    }
}

/// # Errors produced by unit updates.
///
/// Every variant maps to a [`FailureKind`] via [`UpdateError::kind`]; the kind
/// selects the recovery strategy once a unit gets isolated.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum UpdateError {
    /// Update exceeded the configured per-update timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Network-like failure, may succeed if retried.
    #[error("transient failure: {message}")]
    Transient {
        /// Underlying message.
        message: String,
    },

    /// Memory/cache pressure.
    #[error("resource exhausted: {message}")]
    Resource {
        /// Underlying message.
        message: String,
    },

    /// Widget configuration is invalid.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Underlying message.
        message: String,
    },

    /// The update future panicked.
    #[error("update panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// Failure with an explicit (possibly custom) kind tag.
    #[error("{kind} failure: {message}")]
    Failed {
        /// Kind tag used for strategy lookup.
        kind: FailureKind,
        /// Underlying message.
        message: String,
    },
}

impl UpdateError {
    /// Shorthand for [`UpdateError::Transient`].
    pub fn transient(message: impl Into<String>) -> Self {
        UpdateError::Transient {
            message: message.into(),
        }
    }

    /// Shorthand for [`UpdateError::Resource`].
    pub fn resource(message: impl Into<String>) -> Self {
        UpdateError::Resource {
            message: message.into(),
        }
    }

    /// Shorthand for [`UpdateError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        UpdateError::Configuration {
            message: message.into(),
        }
    }

    /// Unclassified failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::with_kind(FailureKind::UNCLASSIFIED, message)
    }

    /// Failure with an arbitrary kind tag.
    pub fn with_kind(kind: FailureKind, message: impl Into<String>) -> Self {
        UpdateError::Failed {
            kind,
            message: message.into(),
        }
    }

    /// Returns the kind tag used for strategy lookup.
    pub fn kind(&self) -> FailureKind {
        match self {
            UpdateError::Timeout { .. } | UpdateError::Transient { .. } => FailureKind::TRANSIENT,
            UpdateError::Resource { .. } => FailureKind::RESOURCE,
            UpdateError::Configuration { .. } => FailureKind::CONFIGURATION,
            UpdateError::Panicked { .. } => FailureKind::UNCLASSIFIED,
            UpdateError::Failed { kind, .. } => kind.clone(),
        }
    }

    /// Returns the human-readable message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            UpdateError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            UpdateError::Transient { message }
            | UpdateError::Resource { message }
            | UpdateError::Configuration { message }
            | UpdateError::Panicked { message }
            | UpdateError::Failed { message, .. } => message.clone(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use widgetvisor::UpdateError;
    /// use std::time::Duration;
    ///
    /// let err = UpdateError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "update_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            UpdateError::Timeout { .. } => "update_timeout",
            UpdateError::Transient { .. } => "update_transient",
            UpdateError::Resource { .. } => "update_resource",
            UpdateError::Configuration { .. } => "update_configuration",
            UpdateError::Panicked { .. } => "update_panicked",
            UpdateError::Failed { .. } => "update_failed",
        }
    }

    /// Indicates whether the failure is expected to clear on its own.
    ///
    /// ```
    /// use widgetvisor::UpdateError;
    ///
    /// assert!(UpdateError::transient("dns").is_retryable());
    /// assert!(!UpdateError::configuration("bad url").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpdateError::Timeout { .. } | UpdateError::Transient { .. } | UpdateError::Resource { .. }
        )
    }
}

/// Error returned by [`DashboardHandle`](crate::DashboardHandle) submissions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    /// Command queue is full (try again later or use the async variant).
    #[error("command queue full")]
    Full,

    /// The dashboard was dropped or shut down.
    #[error("dashboard closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(UpdateError::transient("x").kind(), FailureKind::TRANSIENT);
        assert_eq!(
            UpdateError::Timeout {
                timeout: Duration::from_millis(5)
            }
            .kind(),
            FailureKind::TRANSIENT
        );
        assert_eq!(UpdateError::resource("x").kind(), FailureKind::RESOURCE);
        assert_eq!(
            UpdateError::configuration("x").kind(),
            FailureKind::CONFIGURATION
        );
        assert_eq!(UpdateError::failed("x").kind(), FailureKind::UNCLASSIFIED);
        assert_eq!(
            UpdateError::with_kind(FailureKind::new("Foo"), "x").kind(),
            FailureKind::new("Foo")
        );
    }

    #[test]
    fn custom_kind_equals_builtin_with_same_tag() {
        assert_eq!(FailureKind::new("transient"), FailureKind::TRANSIENT);
    }

    #[test]
    fn message_strips_prefix() {
        let err = UpdateError::with_kind(FailureKind::new("Foo"), "exploded");
        assert_eq!(err.message(), "exploded");
        assert_eq!(err.to_string(), "Foo failure: exploded");
    }
}
