//! # Example: operator_console
//!
//! Drives a dashboard by hand with [`Dashboard::tick`] while a second task
//! plays the operator through a [`DashboardHandle`].
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait to print selected events.
//! - Register a recovery strategy for a custom [`FailureKind`].
//! - Report render errors, isolate and force recovery from another task.
//!
//! ## Flow
//! ```text
//! operator task                      main loop
//!   handle.register("ticker") ──►   tick(now) applies queued commands
//!   handle.report_error(render) ──► streak grows ─► isolated
//!                                   isolation_timeout ─► "render" strategy
//!   handle.isolate("ticker", ..) ──► isolated again (manual)
//!   handle.force_recovery(..)  ──►  attempt starts right away
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example operator_console
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use widgetvisor::{
    Config, Dashboard, DashboardHandle, Event, EventKind, FailureKind, StrategyFn, Subscribe,
    UnitSpec, UpdateError,
};

/// Prints the fault-handling events.
struct ConsoleSubscriber;

#[async_trait::async_trait]
impl Subscribe for ConsoleSubscriber {
    async fn on_event(&self, ev: &Event) {
        let unit = ev.unit.as_deref().unwrap_or("-");
        match ev.kind {
            EventKind::ErrorReported | EventKind::UpdateFailed => println!(
                "[sub] error:      unit={unit} kind={} reason={}",
                ev.failure_kind.as_ref().map(FailureKind::as_str).unwrap_or("-"),
                ev.reason.as_deref().unwrap_or("<none>")
            ),
            EventKind::UnitIsolated => println!(
                "[sub] isolated:   unit={unit} reason={}",
                ev.reason.as_deref().unwrap_or("<none>")
            ),
            EventKind::RecoveryScheduled => println!(
                "[sub] scheduled:  unit={unit} after={}ms",
                ev.delay_ms.unwrap_or(0)
            ),
            EventKind::RecoveryStarting => println!(
                "[sub] recovering: unit={unit} attempt={} strategy={}",
                ev.attempt.unwrap_or(0),
                ev.reason.as_deref().unwrap_or("-")
            ),
            EventKind::RecoverySucceeded => println!("[sub] restored:   unit={unit}"),
            EventKind::RecoveryFailed => println!(
                "[sub] attempt failed: unit={unit} attempts={}",
                ev.attempt.unwrap_or(0)
            ),
            EventKind::UnitPermanentlyFailed => println!("[sub] gave up:    unit={unit}"),
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

fn ticker() -> UnitSpec {
    UnitSpec::builder("ticker")
        .with_interval(Duration::from_millis(250))
        .with_priority(3)
        .build(|| async { Ok::<_, UpdateError>(()) })
}

fn render_error() -> UpdateError {
    UpdateError::with_kind(FailureKind::new("render"), "glyph cache out of sync")
}

async fn operator(handle: DashboardHandle) -> anyhow::Result<()> {
    handle.register(ticker()).await?;
    tokio::time::sleep(Duration::from_millis(300)).await;

    println!("[operator] reporting render errors");
    for _ in 0..3 {
        handle.report_error("ticker", render_error(), "draw").await?;
    }

    tokio::time::sleep(Duration::from_millis(1500)).await;
    println!("[operator] isolating ticker by hand");
    handle.isolate("ticker", "feed maintenance").await?;

    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("[operator] forcing recovery");
    handle.force_recovery("ticker").await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = Config {
        max_consecutive_errors: 3,
        isolation_timeout: Duration::from_secs(1),
        ..Config::default()
    };
    let render = StrategyFn::arc("redraw", |_unit, ctx| async move {
        println!("[strategy] redraw attempt {} for {}", ctx.attempt, ctx.unit_id);
        tokio::time::sleep(Duration::from_millis(50)).await;
        true
    });

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(ConsoleSubscriber)];
    let mut dash = Dashboard::builder(cfg)
        .with_subscribers(subs)
        .with_strategy(FailureKind::new("render"), render)
        .build()?;

    let op = tokio::spawn(operator(dash.handle()));

    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(4) {
        let report = dash.tick(Instant::now());
        if !report.isolated.is_empty() || !report.restored.is_empty() {
            println!(
                "[main] tick: isolated={:?} restored={:?}",
                report.isolated, report.restored
            );
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    op.await??;

    if let Some(stats) = dash.unit_stats("ticker") {
        println!(
            "[main] ticker: {} total_errors={} recoveries={}",
            stats.health.as_str(),
            stats.total_errors,
            stats.recoveries_succeeded
        );
    }
    dash.shutdown().await;
    Ok(())
}
