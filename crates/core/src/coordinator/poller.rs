//! Per-run status pollers.
//!
//! One polling task per in-flight run, keyed by run id in a map owned by
//! the [`PollerManager`]. Starting a poller for a run that already has one
//! is a no-op, so a run can never be polled by two loops at once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::{RunId, RunStatus, TicketId, TicketService};
use crate::directory::{AnalyzedDirectory, TicketDirectory};
use crate::metrics;

use super::config::CoordinatorConfig;
use super::events::{RunEvent, RunEvents};
use super::registry::RunRegistry;

/// A live polling task for one run.
struct PollerHandle {
    task: JoinHandle<()>,
}

/// Everything a poller touches when a run reaches a terminal status.
#[derive(Clone)]
pub(crate) struct PollerDeps {
    pub service: Arc<dyn TicketService>,
    pub registry: Arc<RwLock<RunRegistry>>,
    pub tickets: Arc<TicketDirectory>,
    pub analyzed: Arc<AnalyzedDirectory>,
    pub events: RunEvents,
}

/// How a poller's run ended.
enum Outcome {
    Completed,
    Failed { error: String, gave_up: bool },
}

/// Owns the run id to poller map and the polling cadence.
pub struct PollerManager {
    interval: Duration,
    max_attempts: u32,
    deps: PollerDeps,
    pollers: Arc<RwLock<HashMap<RunId, PollerHandle>>>,
}

impl PollerManager {
    pub(crate) fn new(config: &CoordinatorConfig, deps: PollerDeps) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.max_poll_attempts,
            deps,
            pollers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start polling a run. No-op if a poller for this run id is already
    /// active; a second loop would double-apply terminal side effects.
    pub async fn start(&self, run_id: RunId) {
        let mut pollers = self.pollers.write().await;
        if pollers.contains_key(&run_id) {
            debug!(run_id, "Poller already active, not starting another");
            return;
        }

        let task = tokio::spawn(Self::poll_run(
            run_id,
            self.interval,
            self.max_attempts,
            self.deps.clone(),
            Arc::clone(&self.pollers),
        ));
        pollers.insert(run_id, PollerHandle { task });
        debug!(run_id, "Poller started");
    }

    /// Cancel a run's scheduled ticks and drop its handle. Claims are left
    /// untouched; this is for registry teardown, not terminal handling.
    pub async fn stop(&self, run_id: RunId) -> bool {
        let handle = self.pollers.write().await.remove(&run_id);
        match handle {
            Some(handle) => {
                handle.task.abort();
                debug!(run_id, "Poller stopped");
                true
            }
            None => false,
        }
    }

    /// Cancel every active poller. Returns how many were stopped.
    pub async fn stop_all(&self) -> usize {
        let handles: Vec<(RunId, PollerHandle)> =
            self.pollers.write().await.drain().collect();
        let count = handles.len();
        for (run_id, handle) in handles {
            handle.task.abort();
            debug!(run_id, "Poller stopped");
        }
        if count > 0 {
            info!(count, "Stopped all pollers");
        }
        count
    }

    /// Number of live pollers.
    pub async fn active_count(&self) -> usize {
        self.pollers.read().await.len()
    }

    /// Whether the given run currently has a live poller.
    pub async fn is_active(&self, run_id: RunId) -> bool {
        self.pollers.read().await.contains_key(&run_id)
    }

    /// The polling loop for one run: one status check immediately, then one
    /// per interval, until the server reports a terminal status or the
    /// attempt ceiling is hit. Transient errors are retried on the next
    /// tick and never surfaced.
    async fn poll_run(
        run_id: RunId,
        interval: Duration,
        max_attempts: u32,
        deps: PollerDeps,
        pollers: Arc<RwLock<HashMap<RunId, PollerHandle>>>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts: u32 = 0;

        loop {
            ticker.tick().await;
            attempts += 1;

            match deps.service.run_status(run_id).await {
                Ok(report) => {
                    metrics::STATUS_CHECKS.with_label_values(&["ok"]).inc();
                    match report.status {
                        RunStatus::Pending | RunStatus::Processing => {
                            debug!(run_id, status = report.status.as_str(), "Run still in flight");
                            deps.registry.write().await.set_status(run_id, report.status);
                        }
                        RunStatus::Completed => {
                            Self::finish(run_id, Outcome::Completed, &deps, &pollers).await;
                            return;
                        }
                        RunStatus::Failed => {
                            let outcome = Outcome::Failed {
                                error: format!("Analysis run {run_id} failed"),
                                gave_up: false,
                            };
                            Self::finish(run_id, outcome, &deps, &pollers).await;
                            return;
                        }
                    }
                }
                Err(e) => {
                    // Transient by assumption; the run stays pollable.
                    metrics::STATUS_CHECKS.with_label_values(&["error"]).inc();
                    debug!(run_id, error = %e, "Status check failed, retrying next tick");
                }
            }

            if max_attempts > 0 && attempts >= max_attempts {
                warn!(run_id, attempts, "Run never reached a terminal status, giving up");
                let outcome = Outcome::Failed {
                    error: format!(
                        "Analysis run {run_id} did not finish after {attempts} status checks"
                    ),
                    gave_up: true,
                };
                Self::finish(run_id, outcome, &deps, &pollers).await;
                return;
            }
        }
    }

    /// Terminal handling, as one logical unit.
    ///
    /// Removing the handle is the linearization point: whoever removes it
    /// owns the release of the run's claims, so a tick that observes a
    /// terminal status after an explicit stop finds the handle gone and
    /// does nothing.
    async fn finish(
        run_id: RunId,
        outcome: Outcome,
        deps: &PollerDeps,
        pollers: &Arc<RwLock<HashMap<RunId, PollerHandle>>>,
    ) {
        {
            let mut pollers = pollers.write().await;
            if pollers.remove(&run_id).is_none() {
                debug!(run_id, "Poller already removed, ignoring terminal observation");
                return;
            }
        }

        let released = deps.registry.write().await.release(run_id);
        let released_ids: Vec<TicketId> = released.iter().map(|t| t.id).collect();
        deps.tickets.readmit(&released_ids).await;

        match outcome {
            Outcome::Completed => {
                metrics::RUN_OUTCOMES.with_label_values(&["completed"]).inc();
                info!(run_id, released = released_ids.len(), "Analysis run completed");
                // The server has moved these tickets to analyzed; reload
                // both projections so neither shows stale state.
                deps.tickets.refresh().await;
                deps.analyzed.refresh().await;
                deps.events.publish(RunEvent::Completed { run_id });
            }
            Outcome::Failed { error, gave_up } => {
                let outcome_label = if gave_up { "gave_up" } else { "failed" };
                metrics::RUN_OUTCOMES.with_label_values(&[outcome_label]).inc();
                warn!(run_id, released = released_ids.len(), error = %error, "Analysis run failed");
                // The server reverts failed tickets to ready; reload so
                // they reappear, then surface the failure.
                deps.tickets.refresh().await;
                deps.tickets.set_error(error.clone()).await;
                deps.events.publish(RunEvent::Failed { run_id, error });
            }
        }
    }
}
