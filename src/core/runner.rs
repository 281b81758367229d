//! # Outstanding operations.
//!
//! Wraps unit updates and recovery attempts into [`Op`] futures and keeps the
//! unfinished ones in a [`FuturesUnordered`].
//!
//! ## Rules
//! - A new op is polled once when started, so work that completes without
//!   waiting finishes in dispatch order within the same tick.
//! - Panics and timeouts never escape an op; they become [`UpdateError`]s
//!   (or a failed recovery).
//! - Only update ops count against the concurrency cap.
//! - Every pending op is attributed to its unit id, so a shutdown that runs
//!   out of time can name what is still running.
//!
//! ```text
//! start(op) ──► poll once ──► Ready(outcome) ──► returned to caller
//!                   │
//!                   └──► Pending ──► pending set ──► harvest()/next()
//! ```

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;

use crate::core::table::UnitKey;
use crate::error::UpdateError;
use crate::subscribers::panic_message;
use crate::units::UnitRef;

/// Finished operation.
pub(crate) enum Outcome {
    Update {
        key: UnitKey,
        id: Arc<str>,
        /// Isolation epoch of the unit when the update was dispatched.
        epoch: u32,
        result: Result<(), UpdateError>,
    },
    Recovery {
        key: UnitKey,
        id: Arc<str>,
        success: bool,
    },
}

impl Outcome {
    fn is_update(&self) -> bool {
        matches!(self, Outcome::Update { .. })
    }

    fn id(&self) -> &Arc<str> {
        match self {
            Outcome::Update { id, .. } | Outcome::Recovery { id, .. } => id,
        }
    }
}

pub(crate) type Op = BoxFuture<'static, Outcome>;

/// Runs one update of `unit`, with an optional timeout.
pub(crate) fn update_op(
    key: UnitKey,
    id: Arc<str>,
    epoch: u32,
    unit: &UnitRef,
    timeout: Option<Duration>,
) -> Op {
    let made = std::panic::catch_unwind(AssertUnwindSafe(|| unit.update()));
    async move {
        let caught = match made {
            Err(payload) => Err(payload),
            Ok(fut) => {
                let fut = AssertUnwindSafe(fut).catch_unwind();
                match timeout {
                    Some(dur) => match tokio::time::timeout(dur, fut).await {
                        Ok(caught) => caught,
                        Err(_elapsed) => Ok(Err(UpdateError::Timeout { timeout: dur })),
                    },
                    None => fut.await,
                }
            }
        };
        let result = caught.unwrap_or_else(|payload| {
            Err(UpdateError::Panicked {
                message: panic_message(payload.as_ref()),
            })
        });
        Outcome::Update {
            key,
            id,
            epoch,
            result,
        }
    }
    .boxed()
}

/// Runs one recovery attempt.
pub(crate) fn recovery_op(key: UnitKey, id: Arc<str>, attempt: BoxFuture<'static, bool>) -> Op {
    async move {
        let success = attempt.await;
        Outcome::Recovery { key, id, success }
    }
    .boxed()
}

/// Set of unfinished operations.
#[derive(Default)]
pub(crate) struct InFlight {
    pending: FuturesUnordered<Op>,
    updates: usize,
    /// Pending ops per unit id, orphans and recovery attempts included.
    owners: BTreeMap<Arc<str>, usize>,
}

impl InFlight {
    /// Polls `op` once. Returns its outcome if it finished, otherwise keeps it
    /// on behalf of `id`.
    pub fn start(&mut self, id: &Arc<str>, mut op: Op) -> Option<Outcome> {
        if let Some(outcome) = (&mut op).now_or_never() {
            return Some(outcome);
        }
        self.pending.push(op);
        *self.owners.entry(Arc::clone(id)).or_default() += 1;
        None
    }

    /// Same as [`start`](Self::start) for an update op, tracked against the cap.
    pub fn start_update(&mut self, id: &Arc<str>, op: Op) -> Option<Outcome> {
        let outcome = self.start(id, op);
        if outcome.is_none() {
            self.updates += 1;
        }
        outcome
    }

    /// Collects every op that has finished since the last call.
    pub fn harvest(&mut self) -> Vec<Outcome> {
        let mut done = Vec::new();
        while let Some(Some(outcome)) = self.pending.next().now_or_never() {
            self.settle(&outcome);
            done.push(outcome);
        }
        done
    }

    /// Waits for the next op to finish.
    pub async fn next(&mut self) -> Option<Outcome> {
        let outcome = self.pending.next().await?;
        self.settle(&outcome);
        Some(outcome)
    }

    fn settle(&mut self, outcome: &Outcome) {
        if outcome.is_update() {
            self.updates = self.updates.saturating_sub(1);
        }
        if let Some(n) = self.owners.get_mut(outcome.id()) {
            *n -= 1;
            if *n == 0 {
                self.owners.remove(outcome.id());
            }
        }
    }

    /// Sorted ids of units with an op still pending.
    pub fn owners(&self) -> Vec<String> {
        self.owners.keys().map(|id| id.to_string()).collect()
    }

    /// Outstanding update ops.
    pub fn updates(&self) -> usize {
        self.updates
    }
}
