//! # Dashboard: update scheduling with fault isolation.
//!
//! A [`Dashboard`] owns every registered unit and is driven by a host calling
//! [`tick`](Dashboard::tick) with the current instant (or by
//! [`run`](Dashboard::run), which ticks on an interval). All bookkeeping
//! happens inside `tick` and the other `&mut self` methods; unit futures run
//! concurrently in between but never touch dashboard state.
//!
//! ## One tick
//! ```text
//! tick(now)
//!   ├─► apply queued DashboardHandle commands
//!   ├─► harvest finished updates / recovery attempts
//!   │     update ok    ─► next_due = now + interval, streak reset
//!   │     update error ─► record ─► IsolationPolicy ─► maybe isolate
//!   │     recovery     ─► RecoveryEngine::finish (restore / reschedule / fail)
//!   ├─► retention sweep (every sweep_interval)
//!   ├─► start recovery attempts that are due
//!   └─► dispatch due units: priority ↓, next_due ↑, registration ↑
//!                           at most concurrency_cap − in-flight
//! ```
//!
//! ## Rules
//! - At most one update per unit is outstanding.
//! - Hidden, isolated, recovering and failed units are never dispatched; the
//!   one exception is the verification update owed after a recovery.
//! - Recovery attempts do not count against the concurrency cap.
//! - Updates of unregistered units keep their slot until they finish; their
//!   results are discarded.
//! - So are results of updates dispatched before the unit's latest isolation;
//!   the unit's next update waits for them.
//! - A unit's failure never affects another unit's schedule.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::config::Config;
use crate::core::handle::{Command, DashboardHandle};
use crate::core::runner::{self, InFlight, Outcome};
use crate::core::scheduler;
use crate::core::shutdown;
use crate::core::table::{UnitKey, UnitRecord, UnitTable};
use crate::error::{DashboardError, UpdateError};
use crate::events::{Bus, Event, EventKind};
use crate::policies::{IsolationPolicy, IsolationReason};
use crate::recovery::{Begin, Finish, HealthState, RecoveryEngine};
use crate::stats::{self, SystemStats, UnitStats};
use crate::subscribers::SubscriberSet;
use crate::tracker::ErrorHistory;
use crate::units::UnitSpec;

/// What one [`Dashboard::tick`] did.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    /// Units whose update was dispatched, in dispatch order.
    pub dispatched: Vec<Arc<str>>,
    /// Updates that finished during the tick (including ones dispatched by it).
    pub completed: usize,
    /// Units whose update failed.
    pub failed: Vec<Arc<str>>,
    /// Units taken out of rotation.
    pub isolated: Vec<Arc<str>>,
    /// Units whose recovery attempt started.
    pub recoveries_started: Vec<Arc<str>>,
    /// Units restored to rotation.
    pub restored: Vec<Arc<str>>,
    /// Units that ran out of recovery attempts.
    pub permanently_failed: Vec<Arc<str>>,
}

/// Forwards bus events to the subscriber set until stopped.
struct Listener {
    token: CancellationToken,
    task: JoinHandle<SubscriberSet>,
}

impl Listener {
    fn spawn(bus: &Bus, set: SubscriberSet) -> Self {
        let token = CancellationToken::new();
        let stop = token.clone();
        let mut rx = bus.subscribe();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(target: "widgetvisor", skipped, "event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => return set,
                    },
                    _ = stop.cancelled() => break,
                }
            }
            while let Ok(ev) = rx.try_recv() {
                set.emit(ev);
            }
            set
        });
        Self { token, task }
    }

    async fn stop(self) {
        self.token.cancel();
        match self.task.await {
            Ok(set) => set.shutdown().await,
            Err(e) => tracing::warn!(target: "widgetvisor", error = %e, "event listener failed"),
        }
    }
}

/// Update scheduler and fault isolation for a set of widgets.
///
/// Created through [`Dashboard::builder`] (or [`Dashboard::new`] for the
/// default strategies and no subscribers).
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tokio::time::Instant;
/// use widgetvisor::{Config, Dashboard, UnitSpec, UpdateError};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), widgetvisor::DashboardError> {
///     let mut dash = Dashboard::new(Config::default())?;
///     dash.register(
///         UnitSpec::builder("clock")
///             .with_interval(Duration::from_secs(1))
///             .with_priority(10)
///             .build(|| async { Ok::<_, UpdateError>(()) }),
///     )?;
///
///     let report = dash.tick(Instant::now());
///     assert_eq!(report.dispatched.len(), 1);
///     assert_eq!(dash.system_stats().active, 1);
///     Ok(())
/// }
/// ```
pub struct Dashboard {
    cfg: Config,
    table: UnitTable,
    in_flight: InFlight,
    policy: IsolationPolicy,
    engine: RecoveryEngine,
    bus: Bus,
    commands: mpsc::Receiver<Command>,
    commands_tx: mpsc::Sender<Command>,
    /// Latest instant seen; used by calls that carry no time of their own.
    clock: Instant,
    next_sweep_at: Instant,
    listener: Option<Listener>,
}

impl Dashboard {
    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        engine: RecoveryEngine,
        subscribers: SubscriberSet,
    ) -> Self {
        let (commands_tx, commands) = mpsc::channel(cfg.command_capacity_clamped());
        let listener = (!subscribers.is_empty()).then(|| Listener::spawn(&bus, subscribers));
        let clock = Instant::now();
        Self {
            policy: cfg.isolation_policy(),
            next_sweep_at: clock + cfg.sweep_interval,
            cfg,
            table: UnitTable::default(),
            in_flight: InFlight::default(),
            engine,
            bus,
            commands,
            commands_tx,
            clock,
            listener,
        }
    }

    /// Starts building a dashboard.
    pub fn builder(cfg: Config) -> crate::core::builder::DashboardBuilder {
        crate::core::builder::DashboardBuilder::new(cfg)
    }

    /// Dashboard with the built-in recovery strategies and no subscribers.
    pub fn new(cfg: Config) -> Result<Self, DashboardError> {
        Self::builder(cfg).build()
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns a handle for queuing commands from other tasks.
    pub fn handle(&self) -> DashboardHandle {
        DashboardHandle::new(self.commands_tx.clone())
    }

    /// Subscribes to the raw event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    // ---- registry --------------------------------------------------------

    /// Enrolls a unit; it is due immediately.
    ///
    /// Fails on a duplicate id or a zero interval.
    pub fn register(&mut self, spec: UnitSpec) -> Result<(), DashboardError> {
        if spec.interval().is_zero() {
            return Err(DashboardError::InvalidInterval {
                id: spec.id().to_string(),
            });
        }
        if self.table.contains(spec.id()) {
            return Err(DashboardError::DuplicateUnit {
                id: spec.id().to_string(),
            });
        }
        let now = self.clock;
        let id = spec.shared_id();
        self.table.insert(|seq| UnitRecord::new(spec, seq, now));
        self.bus
            .publish(Event::new(EventKind::UnitRegistered).with_unit(id));
        Ok(())
    }

    /// Removes a unit with its history and timers.
    ///
    /// An update still in flight keeps running; its result is discarded.
    pub fn unregister(&mut self, id: &str) -> Result<(), DashboardError> {
        let rec = self
            .table
            .remove(id)
            .ok_or_else(|| DashboardError::not_found(id))?;
        let mut ev = Event::new(EventKind::UnitUnregistered).with_unit(rec.id);
        if rec.in_flight {
            ev = ev.with_reason("update still in flight");
        }
        self.bus.publish(ev);
        Ok(())
    }

    /// Shows or hides a unit. Hidden units keep their schedule but are not
    /// dispatched.
    pub fn set_visible(&mut self, id: &str, visible: bool) -> Result<(), DashboardError> {
        let rec = self
            .table
            .by_id_mut(id)
            .ok_or_else(|| DashboardError::not_found(id))?;
        if rec.visible != visible {
            rec.visible = visible;
            self.bus.publish(
                Event::new(EventKind::VisibilityChanged)
                    .with_unit(Arc::clone(&rec.id))
                    .with_reason(if visible { "shown" } else { "hidden" }),
            );
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.table.contains(id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    // ---- fault handling --------------------------------------------------

    /// Records a failure a unit noticed outside its update (e.g. a render
    /// error). Counts toward isolation exactly like a failed update.
    pub fn handle_error(
        &mut self,
        id: &str,
        error: UpdateError,
        context: impl Into<String>,
    ) -> Result<(), DashboardError> {
        self.report_error(id, error, context.into(), &mut TickReport::default())
    }

    /// Takes a unit out of rotation now. No-op if it already is.
    ///
    /// `note` is appended to the reason of the `UnitIsolated` event.
    pub fn isolate(&mut self, id: &str, note: impl Into<String>) -> Result<(), DashboardError> {
        self.isolate_manually(id, &note.into(), &mut TickReport::default())
    }

    /// Starts a recovery attempt right away with a fresh attempt budget.
    ///
    /// Valid for isolated and permanently failed units. Fails with
    /// [`DashboardError::NotIsolated`] for active units and
    /// [`DashboardError::RecoveryInProgress`] while an attempt runs.
    pub fn force_recovery(&mut self, id: &str) -> Result<(), DashboardError> {
        self.force(id, &mut TickReport::default())
    }

    /// Flags a unit's newest error as recovered, ending its failure streak.
    /// Returns false if there was nothing to flag.
    pub fn mark_recovered(&mut self, id: &str) -> Result<bool, DashboardError> {
        self.table
            .by_id_mut(id)
            .map(|rec| rec.errors.mark_recovered())
            .ok_or_else(|| DashboardError::not_found(id))
    }

    // ---- queries -----------------------------------------------------------

    pub fn health(&self, id: &str) -> Option<HealthState> {
        self.table.by_id(id).map(|r| r.health.state())
    }

    /// True if the unit is out of rotation (isolated, recovering or failed).
    pub fn is_isolated(&self, id: &str) -> bool {
        self.table
            .by_id(id)
            .is_some_and(|r| !r.health.is_active())
    }

    pub fn error_history(&self, id: &str) -> Option<&ErrorHistory> {
        self.table.by_id(id).map(|r| &r.errors)
    }

    pub fn unit_stats(&self, id: &str) -> Option<UnitStats> {
        self.table
            .by_id(id)
            .map(|r| stats::unit_stats(r, self.clock))
    }

    pub fn system_stats(&self) -> SystemStats {
        stats::system_stats(&self.table, self.in_flight.updates(), self.clock)
    }

    /// Outstanding update operations, orphans included.
    pub fn in_flight(&self) -> usize {
        self.in_flight.updates()
    }

    // ---- scheduling --------------------------------------------------------

    /// Runs one scheduling round at `now`.
    ///
    /// `now` never moves the dashboard's clock backwards; an earlier instant
    /// than a previous tick is treated as that tick's instant.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let now = now.max(self.clock);
        self.clock = now;
        let mut report = TickReport::default();

        self.apply_commands(&mut report);

        for outcome in self.in_flight.harvest() {
            self.on_outcome(outcome, now, &mut report);
        }

        if now >= self.next_sweep_at {
            self.sweep(now);
            self.next_sweep_at = now + self.cfg.sweep_interval;
        }

        for key in scheduler::due_recoveries(&self.table, now) {
            self.attempt_recovery(key, now, &mut report);
        }

        let budget = self
            .cfg
            .concurrency_cap
            .saturating_sub(self.in_flight.updates());
        for key in scheduler::select_due(&self.table, now, budget) {
            self.dispatch(key, now, &mut report);
        }

        if !report.dispatched.is_empty() || report.completed > 0 {
            tracing::trace!(
                target: "widgetvisor",
                dispatched = report.dispatched.len(),
                completed = report.completed,
                in_flight = self.in_flight.updates(),
                "tick"
            );
        }
        report
    }

    /// Ticks every `tick_interval` until `token` is cancelled or the process
    /// receives a termination signal, then waits up to `grace` for
    /// outstanding updates.
    pub async fn run(&mut self, token: CancellationToken) -> Result<(), DashboardError> {
        let mut ticker = tokio::time::interval(self.cfg.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let signal = shutdown::shutdown_signal();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = &mut signal => break,
                _ = ticker.tick() => {
                    self.tick(Instant::now());
                }
            }
        }

        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.drain_with_grace().await
    }

    /// Stops the event listener and drains subscriber queues.
    pub async fn shutdown(mut self) {
        if let Some(listener) = self.listener.take() {
            listener.stop().await;
        }
    }

    // ---- internals ---------------------------------------------------------

    fn apply_commands(&mut self, report: &mut TickReport) {
        while let Ok(cmd) = self.commands.try_recv() {
            let res = match cmd {
                Command::Register(spec) => self.register(spec),
                Command::Unregister(id) => self.unregister(&id),
                Command::SetVisible { id, visible } => self.set_visible(&id, visible),
                Command::ReportError { id, error, context } => {
                    self.report_error(&id, error, context, report)
                }
                Command::Isolate { id, note } => self.isolate_manually(&id, &note, report),
                Command::ForceRecovery(id) => self.force(&id, report),
            };
            if let Err(e) = res {
                tracing::warn!(
                    target: "widgetvisor",
                    error = %e,
                    label = e.as_label(),
                    "dashboard command rejected"
                );
            }
        }
    }

    fn report_error(
        &mut self,
        id: &str,
        error: UpdateError,
        context: String,
        report: &mut TickReport,
    ) -> Result<(), DashboardError> {
        let key = self
            .table
            .key_of(id)
            .ok_or_else(|| DashboardError::not_found(id))?;
        self.record_failure(key, &error, Some(context), self.clock, report);
        Ok(())
    }

    fn isolate_manually(
        &mut self,
        id: &str,
        note: &str,
        report: &mut TickReport,
    ) -> Result<(), DashboardError> {
        let now = self.clock;
        let rec = self
            .table
            .by_id_mut(id)
            .ok_or_else(|| DashboardError::not_found(id))?;
        isolate_record(
            &self.engine,
            &self.bus,
            rec,
            IsolationReason::Manual,
            note,
            now,
            report,
        );
        Ok(())
    }

    fn force(&mut self, id: &str, report: &mut TickReport) -> Result<(), DashboardError> {
        let now = self.clock;
        let key = self
            .table
            .key_of(id)
            .ok_or_else(|| DashboardError::not_found(id))?;
        let rec = self
            .table
            .get_mut(key)
            .ok_or_else(|| DashboardError::not_found(id))?;
        self.engine.force(rec, now)?;
        self.bus.publish(
            Event::new(EventKind::ForceRecoveryRequested).with_unit(Arc::clone(&rec.id)),
        );
        self.attempt_recovery(key, now, report);
        Ok(())
    }

    fn dispatch(&mut self, key: UnitKey, now: Instant, report: &mut TickReport) {
        let timeout = self.cfg.update_timeout();
        let Some(rec) = self.table.get_mut(key) else {
            return;
        };
        rec.in_flight = true;
        rec.last_run_at = Some(now);
        rec.verification_pending = false;
        let id = Arc::clone(&rec.id);
        let op = runner::update_op(key, Arc::clone(&id), rec.epoch, &rec.unit, timeout);

        self.bus
            .publish(Event::new(EventKind::UpdateStarting).with_unit(Arc::clone(&id)));
        report.dispatched.push(Arc::clone(&id));
        if let Some(outcome) = self.in_flight.start_update(&id, op) {
            self.on_outcome(outcome, now, report);
        }
    }

    fn attempt_recovery(&mut self, key: UnitKey, now: Instant, report: &mut TickReport) {
        let Some(rec) = self.table.get_mut(key) else {
            return;
        };
        let id = Arc::clone(&rec.id);
        match self.engine.begin(rec, now) {
            Begin::NotIsolated => {}
            Begin::Exhausted { attempts } => {
                self.bus.publish(
                    Event::new(EventKind::UnitPermanentlyFailed)
                        .with_unit(Arc::clone(&id))
                        .with_attempt(attempts),
                );
                report.permanently_failed.push(id);
            }
            Begin::Started(started) => {
                self.bus.publish(
                    Event::new(EventKind::RecoveryStarting)
                        .with_unit(Arc::clone(&id))
                        .with_attempt(started.attempt)
                        .with_failure_kind(started.kind)
                        .with_reason(started.strategy),
                );
                report.recoveries_started.push(Arc::clone(&id));
                let op = runner::recovery_op(key, Arc::clone(&id), started.future);
                if let Some(outcome) = self.in_flight.start(&id, op) {
                    self.on_outcome(outcome, now, report);
                }
            }
        }
    }

    fn on_outcome(&mut self, outcome: Outcome, now: Instant, report: &mut TickReport) {
        match outcome {
            Outcome::Update {
                key,
                id,
                epoch,
                result,
            } => self.on_update_done(key, id, epoch, result, now, report),
            Outcome::Recovery { key, id, success } => {
                self.on_recovery_done(key, id, success, now, report)
            }
        }
    }

    fn on_update_done(
        &mut self,
        key: UnitKey,
        id: Arc<str>,
        epoch: u32,
        result: Result<(), UpdateError>,
        now: Instant,
        report: &mut TickReport,
    ) {
        report.completed += 1;
        let Some(rec) = self.table.get_mut(key) else {
            self.bus
                .publish(Event::new(EventKind::UpdateDiscarded).with_unit(id));
            return;
        };
        rec.in_flight = false;
        if rec.epoch != epoch {
            // Dispatched before the latest isolation; next_due_at belongs to
            // recovery or to the verification update now.
            self.bus.publish(
                Event::new(EventKind::UpdateDiscarded)
                    .with_unit(id)
                    .with_reason("dispatched before isolation"),
            );
            return;
        }
        rec.next_due_at = now + rec.interval;

        match result {
            Ok(()) => {
                rec.counters.updates_succeeded += 1;
                rec.errors.mark_recovered();
                self.bus
                    .publish(Event::new(EventKind::UpdateSucceeded).with_unit(id));
            }
            Err(err) => {
                rec.counters.updates_failed += 1;
                if let UpdateError::Timeout { timeout } = &err {
                    self.bus.publish(
                        Event::new(EventKind::UpdateTimedOut)
                            .with_unit(Arc::clone(&id))
                            .with_timeout(*timeout),
                    );
                }
                report.failed.push(id);
                self.record_failure(key, &err, None, now, report);
            }
        }
    }

    fn on_recovery_done(
        &mut self,
        key: UnitKey,
        id: Arc<str>,
        success: bool,
        now: Instant,
        report: &mut TickReport,
    ) {
        let Some(rec) = self.table.get_mut(key) else {
            self.bus.publish(
                Event::new(EventKind::UpdateDiscarded)
                    .with_unit(id)
                    .with_reason("recovery attempt"),
            );
            return;
        };
        match self.engine.finish(rec, success, now) {
            Finish::Restored { attempt } => {
                self.bus.publish(
                    Event::new(EventKind::RecoverySucceeded)
                        .with_unit(Arc::clone(&id))
                        .with_attempt(attempt),
                );
                report.restored.push(id);
            }
            Finish::Rescheduled { attempts, delay } => {
                self.bus.publish(
                    Event::new(EventKind::RecoveryFailed)
                        .with_unit(Arc::clone(&id))
                        .with_attempt(attempts),
                );
                self.bus.publish(
                    Event::new(EventKind::RecoveryScheduled)
                        .with_unit(id)
                        .with_attempt(attempts)
                        .with_delay(delay),
                );
            }
            Finish::Exhausted { attempts } => {
                self.bus.publish(
                    Event::new(EventKind::RecoveryFailed)
                        .with_unit(Arc::clone(&id))
                        .with_attempt(attempts),
                );
                self.bus.publish(
                    Event::new(EventKind::UnitPermanentlyFailed)
                        .with_unit(Arc::clone(&id))
                        .with_attempt(attempts),
                );
                report.permanently_failed.push(id);
            }
            Finish::Stale => {}
        }
    }

    /// Appends a failure and applies the isolation policy.
    fn record_failure(
        &mut self,
        key: UnitKey,
        error: &UpdateError,
        context: Option<String>,
        now: Instant,
        report: &mut TickReport,
    ) {
        let Some(rec) = self.table.get_mut(key) else {
            return;
        };
        rec.counters.errors_recorded += 1;
        let ev = match context {
            Some(context) => {
                let reason = if context.is_empty() {
                    error.to_string()
                } else {
                    format!("{context}: {error}")
                };
                rec.errors.record_with_context(error, context, now);
                Event::new(EventKind::ErrorReported).with_reason(reason)
            }
            None => {
                rec.errors.record(error, now);
                Event::new(EventKind::UpdateFailed).with_reason(error.to_string())
            }
        };
        self.bus.publish(
            ev.with_unit(Arc::clone(&rec.id))
                .with_failure_kind(error.kind()),
        );

        if !rec.health.is_active() {
            return;
        }
        if let Some(reason) = self.policy.evaluate(&rec.errors, now) {
            isolate_record(&self.engine, &self.bus, rec, reason, "", now, report);
        }
    }

    fn sweep(&mut self, now: Instant) {
        let retention = self.cfg.history_retention;
        let removed: usize = self
            .table
            .iter_mut()
            .map(|rec| rec.errors.prune(now, retention))
            .sum();
        if removed > 0 {
            self.bus
                .publish(Event::new(EventKind::HistorySwept).with_count(removed));
        }
    }

    async fn drain_with_grace(&mut self) -> Result<(), DashboardError> {
        let grace = self.cfg.grace;
        let mut report = TickReport::default();
        let drained = tokio::time::timeout(grace, async {
            while let Some(outcome) = self.in_flight.next().await {
                self.on_outcome(outcome, Instant::now(), &mut report);
            }
        })
        .await;

        match drained {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                let stuck = self.in_flight.owners();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join(", ")),
                );
                Err(DashboardError::GraceExceeded { grace, stuck })
            }
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if let Some(listener) = &self.listener {
            listener.token.cancel();
        }
    }
}

fn isolate_record(
    engine: &RecoveryEngine,
    bus: &Bus,
    rec: &mut UnitRecord,
    reason: IsolationReason,
    note: &str,
    now: Instant,
    report: &mut TickReport,
) {
    let Some(wait) = engine.isolate(rec, reason, now) else {
        return;
    };
    let id = Arc::clone(&rec.id);
    let reason = if note.is_empty() {
        reason.to_string()
    } else {
        format!("{reason}: {note}")
    };
    bus.publish(
        Event::new(EventKind::UnitIsolated)
            .with_unit(Arc::clone(&id))
            .with_reason(reason),
    );
    bus.publish(
        Event::new(EventKind::RecoveryScheduled)
            .with_unit(Arc::clone(&id))
            .with_attempt(0)
            .with_delay(wait),
    );
    report.isolated.push(id);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering::SeqCst};
    use std::time::Duration;

    use super::*;
    use crate::error::FailureKind;
    use crate::recovery::{RecoveryStrategy, StrategyFn, StrategyRegistry};

    const MS: Duration = Duration::from_millis(1);
    const SEC: Duration = Duration::from_secs(1);

    fn cfg() -> Config {
        Config {
            concurrency_cap: 8,
            max_consecutive_errors: 3,
            max_errors_per_minute: 100,
            isolation_timeout: SEC,
            max_recovery_attempts: 3,
            ..Config::default()
        }
    }

    fn dashboard(cfg: Config) -> Dashboard {
        Dashboard::new(cfg).unwrap()
    }

    fn with_strategy(cfg: Config, strategy: Arc<dyn RecoveryStrategy>) -> Dashboard {
        Dashboard::builder(cfg)
            .with_strategies(StrategyRegistry::with_fallback(strategy))
            .build()
            .unwrap()
    }

    fn switch(ok: &Arc<AtomicBool>) -> Arc<dyn RecoveryStrategy> {
        let ok = Arc::clone(ok);
        StrategyFn::arc("switch", move |_u, _c| {
            let ok = Arc::clone(&ok);
            async move { ok.load(SeqCst) }
        })
    }

    fn ok_unit(id: &str, interval: Duration, priority: i32) -> UnitSpec {
        UnitSpec::builder(id)
            .with_interval(interval)
            .with_priority(priority)
            .build(|| async { Ok::<_, UpdateError>(()) })
    }

    /// Unit counting its updates; fails while `fail` is set.
    fn flaky(id: &str, calls: &Arc<AtomicUsize>, fail: &Arc<AtomicBool>) -> UnitSpec {
        let calls = Arc::clone(calls);
        let fail = Arc::clone(fail);
        UnitSpec::builder(id)
            .with_interval(10 * MS)
            .build(move || {
                let calls = Arc::clone(&calls);
                let fail = Arc::clone(&fail);
                async move {
                    calls.fetch_add(1, SeqCst);
                    if fail.load(SeqCst) {
                        Err(UpdateError::transient("boom"))
                    } else {
                        Ok(())
                    }
                }
            })
    }

    fn failing(id: &str, error: UpdateError) -> UnitSpec {
        UnitSpec::builder(id)
            .with_interval(10 * MS)
            .build(move || {
                let error = error.clone();
                async move { Err::<(), _>(error) }
            })
    }

    fn sleeping(id: &str, d: Duration) -> UnitSpec {
        UnitSpec::builder(id).build(move || async move {
            tokio::time::sleep(d).await;
            Ok::<_, UpdateError>(())
        })
    }

    fn stuck(id: &str) -> UnitSpec {
        UnitSpec::builder(id).build(|| std::future::pending::<Result<(), UpdateError>>())
    }

    fn ids(v: &[Arc<str>]) -> Vec<&str> {
        v.iter().map(|s| &**s).collect()
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn register_validates() {
        let mut dash = dashboard(cfg());
        dash.register(ok_unit("a", SEC, 0)).unwrap();
        assert!(matches!(
            dash.register(ok_unit("a", SEC, 0)),
            Err(DashboardError::DuplicateUnit { .. })
        ));
        assert!(matches!(
            dash.register(ok_unit("z", Duration::ZERO, 0)),
            Err(DashboardError::InvalidInterval { .. })
        ));
        assert!(matches!(
            dash.unregister("nope"),
            Err(DashboardError::UnitNotFound { .. })
        ));
        assert_eq!(dash.len(), 1);
    }

    #[tokio::test]
    async fn dispatch_order_is_priority_then_registration() {
        let mut dash = dashboard(cfg());
        dash.register(ok_unit("low", SEC, 1)).unwrap();
        dash.register(ok_unit("high", SEC, 9)).unwrap();
        dash.register(ok_unit("mid-a", SEC, 5)).unwrap();
        dash.register(ok_unit("mid-b", SEC, 5)).unwrap();

        let report = dash.tick(Instant::now());
        assert_eq!(ids(&report.dispatched), ["high", "mid-a", "mid-b", "low"]);
        assert_eq!(report.completed, 4);
    }

    #[tokio::test]
    async fn concurrency_cap_bounds_in_flight_updates() {
        let mut dash = dashboard(Config {
            concurrency_cap: 2,
            ..cfg()
        });
        for id in ["a", "b", "c", "d"] {
            dash.register(stuck(id)).unwrap();
        }
        let t0 = Instant::now();
        assert_eq!(ids(&dash.tick(t0).dispatched), ["a", "b"]);
        assert_eq!(dash.in_flight(), 2);
        assert!(dash.tick(t0 + SEC).dispatched.is_empty());
        assert_eq!(dash.system_stats().in_flight, 2);
    }

    #[tokio::test]
    async fn updates_respect_interval() {
        let mut dash = dashboard(cfg());
        dash.register(ok_unit("clock", 100 * MS, 0)).unwrap();
        let t0 = Instant::now();
        assert_eq!(dash.tick(t0).dispatched.len(), 1);
        assert!(dash.tick(t0 + 50 * MS).dispatched.is_empty());
        assert!(dash.tick(t0 + 99 * MS).dispatched.is_empty());
        assert_eq!(dash.tick(t0 + 100 * MS).dispatched.len(), 1);
    }

    #[tokio::test]
    async fn hidden_units_wait_until_shown() {
        let mut dash = dashboard(cfg());
        dash.register(ok_unit("w", SEC, 0).with_visible(false)).unwrap();
        let t0 = Instant::now();
        assert!(dash.tick(t0).dispatched.is_empty());
        dash.set_visible("w", true).unwrap();
        assert_eq!(ids(&dash.tick(t0 + MS).dispatched), ["w"]);
    }

    #[tokio::test]
    async fn isolated_on_third_consecutive_failure() {
        let mut dash = dashboard(cfg());
        dash.register(failing("w", UpdateError::transient("down"))).unwrap();
        let t0 = Instant::now();

        assert!(dash.tick(t0).isolated.is_empty());
        assert!(dash.tick(t0 + 10 * MS).isolated.is_empty());
        assert_eq!(dash.health("w"), Some(HealthState::Active));

        let report = dash.tick(t0 + 20 * MS);
        assert_eq!(ids(&report.failed), ["w"]);
        assert_eq!(ids(&report.isolated), ["w"]);
        assert!(dash.is_isolated("w"));
        assert_eq!(
            dash.unit_stats("w").and_then(|s| s.isolation_reason),
            Some(IsolationReason::ConsecutiveFailures { count: 3 })
        );
        assert!(dash.tick(t0 + 30 * MS).dispatched.is_empty());
    }

    #[tokio::test]
    async fn five_failures_in_ten_seconds_trip_the_rate() {
        let mut dash = dashboard(Config {
            max_errors_per_minute: 5,
            max_consecutive_errors: 100,
            ..cfg()
        });
        dash.register(failing("w", UpdateError::resource("oom")))
            .unwrap();
        let t0 = Instant::now();
        for i in 0..4u32 {
            assert!(dash.tick(t0 + i * 2 * SEC).isolated.is_empty());
        }
        let report = dash.tick(t0 + 8 * SEC);
        assert_eq!(ids(&report.isolated), ["w"]);
        assert_eq!(
            dash.unit_stats("w").and_then(|s| s.isolation_reason),
            Some(IsolationReason::ErrorRate { count: 5 })
        );
    }

    #[tokio::test]
    async fn success_resets_streak_but_not_rate() {
        let mut dash = dashboard(Config {
            max_errors_per_minute: 4,
            max_consecutive_errors: 2,
            ..cfg()
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let fail = Arc::new(AtomicBool::new(true));
        dash.register(flaky("w", &calls, &fail)).unwrap();

        let t0 = Instant::now();
        let mut at = t0;
        for round in 0..3 {
            fail.store(true, SeqCst);
            dash.tick(at);
            at += SEC;
            fail.store(false, SeqCst);
            dash.tick(at);
            at += SEC;
            assert!(!dash.is_isolated("w"), "round {round}");
            assert_eq!(dash.unit_stats("w").map(|s| s.consecutive_errors), Some(0));
        }
        fail.store(true, SeqCst);
        let report = dash.tick(at);
        assert_eq!(ids(&report.isolated), ["w"]);
        assert_eq!(
            dash.unit_stats("w").and_then(|s| s.isolation_reason),
            Some(IsolationReason::ErrorRate { count: 4 })
        );
    }

    #[tokio::test]
    async fn failures_stay_with_their_unit() {
        let mut dash = dashboard(Config {
            max_consecutive_errors: 1,
            ..cfg()
        });
        dash.register(failing("bad", UpdateError::failed("x"))).unwrap();
        dash.register(ok_unit("good", 10 * MS, 0)).unwrap();

        let t0 = Instant::now();
        dash.tick(t0);
        assert!(dash.is_isolated("bad"));
        for i in 1..5u32 {
            assert_eq!(ids(&dash.tick(t0 + i * 10 * MS).dispatched), ["good"]);
        }
        let stats = dash.system_stats();
        assert_eq!((stats.active, stats.isolated), (1, 1));
        assert_eq!(stats.isolated_units, vec!["bad".to_string()]);
    }

    #[tokio::test]
    async fn first_recovery_attempt_after_isolation_timeout() {
        let ok = Arc::new(AtomicBool::new(false));
        let mut dash = with_strategy(cfg(), switch(&ok));
        dash.register(ok_unit("w", SEC, 0)).unwrap();
        let t0 = Instant::now();
        dash.tick(t0);
        dash.isolate("w", "").unwrap();

        assert!(dash.tick(t0 + 999 * MS).recoveries_started.is_empty());
        assert_eq!(
            ids(&dash.tick(t0 + 1000 * MS).recoveries_started),
            ["w"]
        );
    }

    #[tokio::test]
    async fn backoff_grows_until_attempts_run_out() {
        let ok = Arc::new(AtomicBool::new(false));
        let mut dash = with_strategy(
            Config {
                max_recovery_attempts: 4,
                backoff_ceiling: 3 * SEC,
                ..cfg()
            },
            switch(&ok),
        );
        let mut rx = dash.subscribe();
        dash.register(ok_unit("w", SEC, 0)).unwrap();
        let t0 = Instant::now();
        dash.tick(t0);
        dash.isolate("w", "").unwrap();

        let mut attempts = Vec::new();
        for at in [1u32, 3, 6, 9] {
            let report = dash.tick(t0 + at * SEC);
            assert_eq!(ids(&report.recoveries_started), ["w"], "attempt at {at}s");
            attempts.push(dash.unit_stats("w").map(|s| s.recovery_attempts));
        }
        assert_eq!(attempts, [Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(dash.health("w"), Some(HealthState::PermanentlyFailed));

        let delays: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::RecoveryScheduled)
            .map(|e| (e.attempt, e.delay_ms))
            .collect();
        assert_eq!(
            delays,
            [
                (Some(0), Some(1000)),
                (Some(1), Some(2000)),
                (Some(2), Some(3000)),
                (Some(3), Some(3000)),
            ]
        );

        assert!(dash.tick(t0 + 60 * SEC).recoveries_started.is_empty());
        assert_eq!(dash.health("w"), Some(HealthState::PermanentlyFailed));

        ok.store(true, SeqCst);
        dash.force_recovery("w").unwrap();
        assert_eq!(dash.health("w"), Some(HealthState::Active));
        let stats = dash.unit_stats("w").unwrap();
        assert_eq!(stats.recovery_attempts, 0);
        assert_eq!(stats.recoveries_succeeded, 1);
        assert_eq!(stats.recovery_rate, Some(0.2));
    }

    #[tokio::test]
    async fn force_recovery_restarts_attempt_budget() {
        let ok = Arc::new(AtomicBool::new(false));
        let mut dash = with_strategy(
            Config {
                max_recovery_attempts: 1,
                ..cfg()
            },
            switch(&ok),
        );
        dash.register(ok_unit("w", SEC, 0)).unwrap();
        assert!(matches!(
            dash.force_recovery("w"),
            Err(DashboardError::NotIsolated { .. })
        ));

        let t0 = Instant::now();
        dash.tick(t0);
        dash.isolate("w", "").unwrap();
        dash.tick(t0 + SEC);
        assert_eq!(dash.health("w"), Some(HealthState::PermanentlyFailed));

        // Forced attempt fails too: budget of one is spent again right away.
        let failed_before = dash.system_stats().recoveries_failed;
        dash.force_recovery("w").unwrap();
        assert_eq!(dash.system_stats().recoveries_failed, failed_before + 1);
        assert_eq!(dash.health("w"), Some(HealthState::PermanentlyFailed));
    }

    #[tokio::test(start_paused = true)]
    async fn force_is_rejected_while_an_attempt_runs() {
        let slow = StrategyFn::arc("slow", |_u, _c| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            true
        });
        let mut dash = with_strategy(cfg(), slow);
        dash.register(ok_unit("w", SEC, 0)).unwrap();
        let t0 = Instant::now();
        dash.tick(t0);
        dash.isolate("w", "").unwrap();
        dash.tick(t0 + SEC);
        assert_eq!(dash.health("w"), Some(HealthState::Recovering));
        assert!(matches!(
            dash.force_recovery("w"),
            Err(DashboardError::RecoveryInProgress { .. })
        ));

        tokio::time::sleep(Duration::from_secs(6)).await;
        let report = dash.tick(t0 + 7 * SEC);
        assert_eq!(ids(&report.restored), ["w"]);
    }

    #[tokio::test]
    async fn isolate_then_recover_round_trip() {
        let ok = Arc::new(AtomicBool::new(true));
        let mut dash = with_strategy(cfg(), switch(&ok));
        let calls = Arc::new(AtomicUsize::new(0));
        let fail = Arc::new(AtomicBool::new(false));
        dash.register(flaky("w", &calls, &fail)).unwrap();

        let t0 = Instant::now();
        dash.tick(t0);
        dash.handle_error("w", UpdateError::transient("render"), "draw")
            .unwrap();
        dash.set_visible("w", false).unwrap();
        dash.isolate("w", "").unwrap();
        assert_eq!(dash.unit_stats("w").map(|s| s.total_errors), Some(1));

        // Restored units get one verification update even while hidden.
        let report = dash.tick(t0 + SEC);
        assert_eq!(ids(&report.restored), ["w"]);
        assert_eq!(ids(&report.dispatched), ["w"]);
        assert_eq!(calls.load(SeqCst), 2);

        let stats = dash.unit_stats("w").unwrap();
        assert_eq!(stats.health, HealthState::Active);
        assert_eq!(stats.total_errors, 0);
        assert!(dash.tick(t0 + 2 * SEC).dispatched.is_empty());
    }

    #[tokio::test]
    async fn forced_recovery_leaves_no_pending_attempt() {
        let ok = Arc::new(AtomicBool::new(true));
        let mut dash = with_strategy(cfg(), switch(&ok));
        dash.register(ok_unit("w", 10 * SEC, 0)).unwrap();
        let t0 = Instant::now();
        dash.tick(t0);
        dash.isolate("w", "").unwrap();
        dash.force_recovery("w").unwrap();
        assert_eq!(dash.health("w"), Some(HealthState::Active));

        // The attempt first planned for t0 + isolation_timeout never runs.
        for at in [1u32, 2, 5] {
            let report = dash.tick(t0 + at * SEC);
            assert!(report.recoveries_started.is_empty(), "at {at}s");
            assert_eq!(dash.health("w"), Some(HealthState::Active));
        }
        assert_eq!(dash.system_stats().recoveries_succeeded, 1);
    }

    #[tokio::test]
    async fn manual_isolation_carries_its_note() {
        let mut dash = dashboard(cfg());
        let mut rx = dash.subscribe();
        dash.register(ok_unit("w", SEC, 0)).unwrap();
        dash.register(ok_unit("v", SEC, 0)).unwrap();

        dash.isolate("w", "feed maintenance").unwrap();
        dash.isolate("w", "again").unwrap();
        dash.handle().try_isolate("v", "queued").unwrap();
        dash.tick(Instant::now());

        let reasons: Vec<String> = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::UnitIsolated)
            .filter_map(|e| e.reason.map(|r| r.to_string()))
            .collect();
        assert_eq!(
            reasons,
            [
                "isolated by operator: feed maintenance",
                "isolated by operator: queued"
            ]
        );
        assert_eq!(
            dash.unit_stats("w").and_then(|s| s.isolation_reason),
            Some(IsolationReason::Manual)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn update_dispatched_before_isolation_is_discarded() {
        let ok = Arc::new(AtomicBool::new(true));
        let mut dash = with_strategy(
            Config {
                max_consecutive_errors: 1,
                ..cfg()
            },
            switch(&ok),
        );
        let mut rx = dash.subscribe();
        dash.register(
            UnitSpec::builder("w")
                .with_interval(10 * SEC)
                .build(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Err::<(), _>(UpdateError::transient("late"))
                }),
        )
        .unwrap();
        let t0 = Instant::now();
        assert_eq!(ids(&dash.tick(t0).dispatched), ["w"]);
        dash.handle_error("w", UpdateError::transient("render"), "draw")
            .unwrap();
        assert!(dash.is_isolated("w"));

        // Restored while the old update still runs; verification waits for it.
        let report = dash.tick(t0 + SEC);
        assert_eq!(ids(&report.restored), ["w"]);
        assert!(report.dispatched.is_empty());

        tokio::time::sleep(Duration::from_secs(6)).await;
        let report = dash.tick(t0 + 6 * SEC);
        assert_eq!(report.completed, 1);
        assert!(report.failed.is_empty());
        assert!(report.isolated.is_empty());
        assert_eq!(ids(&report.dispatched), ["w"]);

        let stats = dash.unit_stats("w").unwrap();
        assert_eq!(stats.health, HealthState::Active);
        assert_eq!(stats.total_errors, 0);
        assert!(drain(&mut rx).iter().any(|e| {
            e.kind == EventKind::UpdateDiscarded
                && e.reason.as_deref() == Some("dispatched before isolation")
        }));
    }

    #[tokio::test]
    async fn unknown_kind_uses_fallback_strategy() {
        let runs = Arc::new(AtomicUsize::new(0));
        let ok = Arc::new(AtomicBool::new(true));
        let fallback = {
            let runs = Arc::clone(&runs);
            let ok = Arc::clone(&ok);
            StrategyFn::arc("catch-all", move |_u, ctx: crate::RecoveryContext| {
                let runs = Arc::clone(&runs);
                let ok = Arc::clone(&ok);
                async move {
                    assert_eq!(ctx.kind, FailureKind::new("Foo"));
                    runs.fetch_add(1, SeqCst);
                    ok.load(SeqCst)
                }
            })
        };
        let cfg = Config {
            max_consecutive_errors: 1,
            max_recovery_attempts: 1,
            ..cfg()
        };
        let mut dash = Dashboard::builder(cfg)
            .with_fallback_strategy(fallback)
            .build()
            .unwrap();
        let mut rx = dash.subscribe();
        let foo = UpdateError::with_kind(FailureKind::new("Foo"), "weird");
        dash.register(failing("a", foo.clone())).unwrap();
        dash.register(failing("b", foo)).unwrap();

        let t0 = Instant::now();
        dash.tick(t0);
        dash.unregister("b").unwrap();
        // Restored, then the verification update fails and isolates again.
        let report = dash.tick(t0 + SEC);
        assert_eq!(ids(&report.restored), ["a"]);
        assert_eq!(ids(&report.isolated), ["a"]);
        assert_eq!(runs.load(SeqCst), 1);
        let strategy = drain(&mut rx)
            .into_iter()
            .find(|e| e.kind == EventKind::RecoveryStarting)
            .and_then(|e| e.reason);
        assert_eq!(strategy.as_deref(), Some("catch-all"));

        // Same kind, failing fallback: same transitions as a registered strategy.
        ok.store(false, SeqCst);
        let report = dash.tick(t0 + 3 * SEC);
        assert_eq!(ids(&report.permanently_failed), ["a"]);
        assert_eq!(runs.load(SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn orphaned_update_keeps_its_slot_until_done() {
        let mut dash = dashboard(Config {
            concurrency_cap: 1,
            ..cfg()
        });
        let mut rx = dash.subscribe();
        dash.register(sleeping("slow", Duration::from_millis(50)))
            .unwrap();
        let t0 = Instant::now();
        assert_eq!(ids(&dash.tick(t0).dispatched), ["slow"]);

        dash.unregister("slow").unwrap();
        dash.register(ok_unit("next", SEC, 0)).unwrap();
        assert!(dash.tick(t0 + MS).dispatched.is_empty());

        tokio::time::sleep(Duration::from_millis(60)).await;
        let report = dash.tick(t0 + 60 * MS);
        assert_eq!(ids(&report.dispatched), ["next"]);
        assert!(
            drain(&mut rx)
                .iter()
                .any(|e| e.kind == EventKind::UpdateDiscarded && e.unit.as_deref() == Some("slow"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_update_fails_transient() {
        let mut dash = dashboard(Config {
            update_timeout: Duration::from_millis(100),
            ..cfg()
        });
        dash.register(sleeping("slow", Duration::from_secs(10)))
            .unwrap();
        let t0 = Instant::now();
        dash.tick(t0);
        assert_eq!(dash.in_flight(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let report = dash.tick(t0 + 150 * MS);
        assert_eq!(ids(&report.failed), ["slow"]);
        assert_eq!(dash.in_flight(), 0);
        let last = dash.unit_stats("slow").and_then(|s| s.last_error).unwrap();
        assert_eq!(last.kind, FailureKind::TRANSIENT);
    }

    #[tokio::test]
    async fn panicking_update_is_contained() {
        let mut dash = dashboard(cfg());
        dash.register(UnitSpec::builder("boom").build(|| async {
            if true {
                panic!("widget exploded");
            }
            Ok::<_, UpdateError>(())
        }))
        .unwrap();
        dash.register(ok_unit("fine", SEC, 0)).unwrap();

        let report = dash.tick(Instant::now());
        assert_eq!(ids(&report.failed), ["boom"]);
        assert_eq!(report.completed, 2);
        let last = dash.unit_stats("boom").and_then(|s| s.last_error).unwrap();
        assert_eq!(last.kind, FailureKind::UNCLASSIFIED);
        assert!(last.message.contains("widget exploded"));
    }

    #[tokio::test]
    async fn handle_commands_apply_on_next_tick() {
        let mut dash = dashboard(Config {
            max_consecutive_errors: 2,
            ..cfg()
        });
        let handle = dash.handle();
        handle.try_register(ok_unit("w", SEC, 0)).unwrap();
        handle
            .try_report_error("ghost", UpdateError::failed("x"), "draw")
            .unwrap();
        assert!(!dash.contains("w"));

        let t0 = Instant::now();
        assert_eq!(ids(&dash.tick(t0).dispatched), ["w"]);

        handle
            .try_report_error("w", UpdateError::configuration("bad theme"), "render")
            .unwrap();
        handle
            .try_report_error("w", UpdateError::configuration("bad theme"), "render")
            .unwrap();
        let report = dash.tick(t0 + MS);
        assert_eq!(ids(&report.isolated), ["w"]);
        let history = dash.error_history("w").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(
            history.latest().and_then(|r| r.context.as_deref()),
            Some("render")
        );
    }

    #[tokio::test]
    async fn mark_recovered_ends_streak() {
        let mut dash = dashboard(cfg());
        dash.register(ok_unit("w", SEC, 0).with_visible(false)).unwrap();
        dash.handle_error("w", UpdateError::failed("x"), "").unwrap();
        dash.handle_error("w", UpdateError::failed("x"), "").unwrap();
        assert!(dash.mark_recovered("w").unwrap());
        assert!(!dash.mark_recovered("w").unwrap());
        dash.handle_error("w", UpdateError::failed("x"), "").unwrap();
        assert!(!dash.is_isolated("w"));
        assert_eq!(dash.unit_stats("w").map(|s| s.consecutive_errors), Some(1));
    }

    #[tokio::test]
    async fn sweep_drops_expired_records() {
        let mut dash = dashboard(Config {
            history_retention: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(3600),
            ..cfg()
        });
        let mut rx = dash.subscribe();
        dash.register(ok_unit("w", SEC, 0).with_visible(false)).unwrap();
        let t0 = Instant::now();
        dash.tick(t0);
        dash.handle_error("w", UpdateError::failed("old"), "").unwrap();
        assert_eq!(dash.unit_stats("w").map(|s| s.total_errors), Some(1));

        dash.tick(t0 + Duration::from_secs(2 * 3600));
        let stats = dash.unit_stats("w").unwrap();
        assert_eq!(stats.total_errors, 0);
        assert_eq!(stats.lifetime_errors, 1);

        let swept = drain(&mut rx)
            .into_iter()
            .find(|e| e.kind == EventKind::HistorySwept)
            .unwrap();
        assert_eq!((swept.count, swept.attempt), (Some(1), None));
    }

    #[tokio::test(start_paused = true)]
    async fn run_drains_within_grace() {
        let mut dash = dashboard(cfg());
        dash.register(sleeping("slow", Duration::from_millis(300)))
            .unwrap();
        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            cancel.cancel();
        });
        dash.run(token).await.unwrap();
        assert_eq!(dash.in_flight(), 0);
        assert_eq!(
            dash.unit_stats("slow").map(|s| s.updates_succeeded),
            Some(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn run_reports_stuck_units_after_grace() {
        let mut dash = dashboard(Config {
            grace: Duration::from_secs(1),
            ..cfg()
        });
        dash.register(stuck("frozen")).unwrap();
        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            cancel.cancel();
        });
        match dash.run(token).await {
            Err(DashboardError::GraceExceeded { stuck, .. }) => {
                assert_eq!(stuck, vec!["frozen".to_string()])
            }
            other => panic!("expected GraceExceeded, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn grace_report_names_orphans_and_recoveries() {
        let hang = StrategyFn::arc("hang", |_u, _c| async {
            std::future::pending::<bool>().await
        });
        let mut dash = with_strategy(
            Config {
                grace: Duration::from_secs(1),
                ..cfg()
            },
            hang,
        );
        dash.register(stuck("frozen")).unwrap();
        dash.register(stuck("gone")).unwrap();
        dash.register(ok_unit("sick", SEC, 0)).unwrap();
        dash.tick(Instant::now());
        dash.unregister("gone").unwrap();
        dash.isolate("sick", "").unwrap();
        dash.force_recovery("sick").unwrap();
        assert_eq!(dash.health("sick"), Some(HealthState::Recovering));

        let token = CancellationToken::new();
        token.cancel();
        match dash.run(token).await {
            Err(DashboardError::GraceExceeded { stuck, .. }) => {
                assert_eq!(stuck, ["frozen", "gone", "sick"])
            }
            other => panic!("expected GraceExceeded, got {other:?}"),
        }
    }
}
