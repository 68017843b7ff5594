//! Self-scheduled collector loop.
//!
//! Runs are strictly sequential: a tick that arrives while a run is still
//! in flight is delayed, never overlapped. Each run is bounded by the
//! budget, and a shutdown signal ends an in-flight run.

use std::time::{Duration, Instant};

use serde_json::json;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::handler::{Collector, InvocationContext};

/// Loop settings.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub interval: Duration,
    /// Wall-clock budget of a single run. A run still going when it
    /// elapses is abandoned and counted as failed.
    pub budget: Duration,
}

/// Invoke the collector every `schedule.interval` until `shutdown` flips.
///
/// Returns the number of finished runs, including failed and timed-out
/// ones. A run interrupted by shutdown is not counted.
pub async fn run(
    collector: &Collector,
    schedule: Schedule,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    info!(
        interval_secs = schedule.interval.as_secs(),
        budget_secs = schedule.budget.as_secs(),
        "collector loop started"
    );

    let mut ticker = tokio::time::interval(schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut runs = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {
                info!(runs, "collector loop shutting down");
                break;
            }
        }

        let ctx = InvocationContext::new(format!(
            "{}-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%SZ"),
            runs + 1
        ));
        let event = json!({ "source": "spsd.schedule", "run": runs + 1 });
        let started = Instant::now();

        let outcome = tokio::select! {
            outcome = tokio::time::timeout(schedule.budget, collector.handle(&event, &ctx)) => outcome,
            _ = shutdown.changed() => {
                warn!(
                    request_id = %ctx.request_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "shutdown during run, abandoning it"
                );
                break;
            }
        };
        runs += 1;

        match outcome {
            Ok(Ok(response)) => info!(
                request_id = %ctx.request_id,
                batches = response.body.result.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "run complete"
            ),
            Ok(Err(e)) => error!(request_id = %ctx.request_id, error = %e, "run failed"),
            Err(_) => error!(
                request_id = %ctx.request_id,
                budget_ms = schedule.budget.as_millis() as u64,
                "run exceeded its budget, abandoned"
            ),
        }
    }

    runs
}
