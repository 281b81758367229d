//! # Command handle.
//!
//! [`DashboardHandle`] lets widgets and input handlers running elsewhere talk
//! to a dashboard they do not own. Commands are queued and applied at the
//! start of the next [`tick`](crate::Dashboard::tick), in submission order.
//!
//! Each command has an async variant (waits for queue space) and a `try_`
//! variant (fails with [`HandleError::Full`]). Errors from applying a command,
//! such as an unknown id, are logged and published as events, not returned.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{HandleError, UpdateError};
use crate::units::UnitSpec;

/// Queued dashboard mutation.
pub(crate) enum Command {
    Register(UnitSpec),
    Unregister(Arc<str>),
    SetVisible { id: Arc<str>, visible: bool },
    ReportError {
        id: Arc<str>,
        error: UpdateError,
        context: String,
    },
    Isolate { id: Arc<str>, note: String },
    ForceRecovery(Arc<str>),
}

/// Cloneable sender of dashboard commands.
#[derive(Clone)]
pub struct DashboardHandle {
    tx: mpsc::Sender<Command>,
}

impl DashboardHandle {
    pub(crate) fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    async fn send(&self, cmd: Command) -> Result<(), HandleError> {
        self.tx.send(cmd).await.map_err(|_| HandleError::Closed)
    }

    fn try_send(&self, cmd: Command) -> Result<(), HandleError> {
        self.tx.try_send(cmd).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => HandleError::Full,
            mpsc::error::TrySendError::Closed(_) => HandleError::Closed,
        })
    }

    /// Queues a registration.
    pub async fn register(&self, spec: UnitSpec) -> Result<(), HandleError> {
        self.send(Command::Register(spec)).await
    }

    pub fn try_register(&self, spec: UnitSpec) -> Result<(), HandleError> {
        self.try_send(Command::Register(spec))
    }

    /// Queues an unregistration.
    pub async fn unregister(&self, id: impl Into<Arc<str>>) -> Result<(), HandleError> {
        self.send(Command::Unregister(id.into())).await
    }

    pub fn try_unregister(&self, id: impl Into<Arc<str>>) -> Result<(), HandleError> {
        self.try_send(Command::Unregister(id.into()))
    }

    /// Queues a visibility change.
    pub async fn set_visible(
        &self,
        id: impl Into<Arc<str>>,
        visible: bool,
    ) -> Result<(), HandleError> {
        self.send(Command::SetVisible {
            id: id.into(),
            visible,
        })
        .await
    }

    pub fn try_set_visible(&self, id: impl Into<Arc<str>>, visible: bool) -> Result<(), HandleError> {
        self.try_send(Command::SetVisible {
            id: id.into(),
            visible,
        })
    }

    /// Queues a self-reported failure (see [`Dashboard::handle_error`](crate::Dashboard::handle_error)).
    pub async fn report_error(
        &self,
        id: impl Into<Arc<str>>,
        error: UpdateError,
        context: impl Into<String>,
    ) -> Result<(), HandleError> {
        self.send(Command::ReportError {
            id: id.into(),
            error,
            context: context.into(),
        })
        .await
    }

    pub fn try_report_error(
        &self,
        id: impl Into<Arc<str>>,
        error: UpdateError,
        context: impl Into<String>,
    ) -> Result<(), HandleError> {
        self.try_send(Command::ReportError {
            id: id.into(),
            error,
            context: context.into(),
        })
    }

    /// Queues a manual isolation (see [`Dashboard::isolate`](crate::Dashboard::isolate)).
    pub async fn isolate(
        &self,
        id: impl Into<Arc<str>>,
        note: impl Into<String>,
    ) -> Result<(), HandleError> {
        self.send(Command::Isolate {
            id: id.into(),
            note: note.into(),
        })
        .await
    }

    pub fn try_isolate(
        &self,
        id: impl Into<Arc<str>>,
        note: impl Into<String>,
    ) -> Result<(), HandleError> {
        self.try_send(Command::Isolate {
            id: id.into(),
            note: note.into(),
        })
    }

    /// Queues a forced recovery (see [`Dashboard::force_recovery`](crate::Dashboard::force_recovery)).
    pub async fn force_recovery(&self, id: impl Into<Arc<str>>) -> Result<(), HandleError> {
        self.send(Command::ForceRecovery(id.into())).await
    }

    pub fn try_force_recovery(&self, id: impl Into<Arc<str>>) -> Result<(), HandleError> {
        self.try_send(Command::ForceRecovery(id.into()))
    }
}
