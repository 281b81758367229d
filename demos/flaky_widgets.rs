//! # Example: flaky_widgets
//!
//! A handful of widgets with different failure habits, driven by
//! [`Dashboard::run`] for a few seconds.
//!
//! Shows how to:
//! - Register units with intervals and priorities.
//! - Attach the built-in [`LogWriter`] and a `tracing` subscriber.
//! - Watch isolation, backoff and recovery play out in the log.
//!
//! ## Widgets
//! ```text
//! clock    never fails
//! weather  fails transiently about one update in three
//! cpu      runs out of memory three times, then behaves
//! rss      misconfigured; ends up permanently failed
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=widgetvisor=debug cargo run --example flaky_widgets
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use widgetvisor::{Config, Dashboard, LogWriter, Subscribe, UnitSpec, UpdateError};

fn clock() -> UnitSpec {
    UnitSpec::builder("clock")
        .with_interval(Duration::from_millis(200))
        .with_priority(10)
        .build(|| async { Ok::<_, UpdateError>(()) })
}

fn weather() -> UnitSpec {
    let calls = Arc::new(AtomicU32::new(0));
    UnitSpec::builder("weather")
        .with_interval(Duration::from_millis(300))
        .with_priority(5)
        .build(move || {
            let n = calls.fetch_add(1, Ordering::Relaxed);
            async move {
                tokio::time::sleep(Duration::from_millis(80)).await;
                if n % 3 == 2 {
                    return Err(UpdateError::transient("api.weather: connection reset"));
                }
                Ok(())
            }
        })
}

fn cpu() -> UnitSpec {
    let calls = Arc::new(AtomicU32::new(0));
    UnitSpec::builder("cpu")
        .with_interval(Duration::from_millis(150))
        .with_priority(7)
        .build(move || {
            let n = calls.fetch_add(1, Ordering::Relaxed);
            async move {
                if n < 3 {
                    return Err(UpdateError::resource("sample buffer exhausted"));
                }
                Ok(())
            }
        })
}

fn rss() -> UnitSpec {
    UnitSpec::builder("rss")
        .with_interval(Duration::from_millis(250))
        .build(|| async { Err::<(), _>(UpdateError::configuration("feed url is empty")) })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("widgetvisor=info")),
        )
        .init();

    let cfg = Config {
        concurrency_cap: 3,
        max_consecutive_errors: 3,
        isolation_timeout: Duration::from_millis(500),
        backoff_ceiling: Duration::from_secs(2),
        max_recovery_attempts: 3,
        update_timeout: Duration::from_secs(1),
        tick_interval: Duration::from_millis(50),
        ..Config::default()
    };

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let mut dash = Dashboard::builder(cfg).with_subscribers(subs).build()?;
    for spec in [clock(), weather(), cpu(), rss()] {
        dash.register(spec)?;
    }

    let token = CancellationToken::new();
    let stop = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(8)).await;
        stop.cancel();
    });

    dash.run(token).await?;

    let stats = dash.system_stats();
    println!(
        "[main] active={} isolated={} failed={:?} errors_by_kind={:?}",
        stats.active, stats.isolated, stats.failed_units, stats.errors_by_kind
    );
    for id in ["clock", "weather", "cpu", "rss"] {
        if let Some(s) = dash.unit_stats(id) {
            println!(
                "[main] {id:8} {:18} ok={} failed={} recoveries={}/{}",
                s.health.as_str(),
                s.updates_succeeded,
                s.updates_failed,
                s.recoveries_succeeded,
                s.recoveries_succeeded + s.recoveries_failed,
            );
        }
    }

    dash.shutdown().await;
    Ok(())
}
