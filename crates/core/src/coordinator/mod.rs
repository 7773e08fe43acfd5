//! Analysis run lifecycle coordinator.
//!
//! Owns everything between "user submits tickets" and "results are
//! visible": the per-run claim registry, the per-run status pollers, crash
//! recovery, and the terminal-transition broadcast. All ticket and run
//! state is server-authoritative; local mutations are optimistic
//! transitions that the next directory load reconciles.

mod config;
mod events;
mod poller;
mod reconciler;
mod registry;
mod types;

pub use config::CoordinatorConfig;
pub use events::{RunEvent, RunEvents};
pub use poller::PollerManager;
pub use registry::RunRegistry;
pub use types::{CoordinatorError, CoordinatorStatus, ProcessingTicket, RecoveryReport};

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::api::{RunId, Ticket, TicketId, TicketService};
use crate::directory::{AnalyzedDirectory, TicketDirectory};
use crate::metrics;

use poller::PollerDeps;

/// Facade over the run lifecycle machinery.
pub struct Coordinator {
    service: Arc<dyn TicketService>,
    registry: Arc<RwLock<RunRegistry>>,
    pollers: PollerManager,
    tickets: Arc<TicketDirectory>,
    events: RunEvents,
    recovery_page_size: u32,
}

impl Coordinator {
    /// Create a coordinator over the given service and views.
    pub fn new(
        config: CoordinatorConfig,
        service: Arc<dyn TicketService>,
        tickets: Arc<TicketDirectory>,
        analyzed: Arc<AnalyzedDirectory>,
    ) -> Self {
        let registry = Arc::new(RwLock::new(RunRegistry::new()));
        let events = RunEvents::new(config.event_capacity);
        let deps = PollerDeps {
            service: Arc::clone(&service),
            registry: Arc::clone(&registry),
            tickets: Arc::clone(&tickets),
            analyzed,
            events: events.clone(),
        };
        let pollers = PollerManager::new(&config, deps);

        Self {
            service,
            registry,
            pollers,
            tickets,
            events,
            recovery_page_size: config.recovery_page_size,
        }
    }

    /// The terminal-transition broadcast handle.
    pub fn events(&self) -> &RunEvents {
        &self.events
    }

    /// Subscribe to terminal-transition events.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    /// Submit the currently selected tickets as one analysis run.
    pub async fn submit_selected(&self) -> Result<RunId, CoordinatorError> {
        let selected = self.tickets.selected_tickets().await;
        if selected.is_empty() {
            return Err(CoordinatorError::NothingToAnalyze);
        }
        self.submit(selected, true).await
    }

    /// Submit every currently ready ticket as one analysis run.
    ///
    /// The visible ready set is snapshotted before anything is cleared, so
    /// tickets arriving concurrently are not silently claimed; the server
    /// resolves "all ready" on its own authoritative view.
    pub async fn submit_all(&self) -> Result<RunId, CoordinatorError> {
        let snapshot = self.tickets.visible_tickets().await;
        if snapshot.is_empty() {
            return Err(CoordinatorError::NothingToAnalyze);
        }
        self.submit(snapshot, false).await
    }

    /// Submit a run and, on success, perform the local transition as one
    /// unit: hide the tickets from the ready view, record their claims,
    /// start the run's poller. On failure nothing is mutated, so the user
    /// can retry with the same selection.
    async fn submit(&self, snapshot: Vec<Ticket>, explicit: bool) -> Result<RunId, CoordinatorError> {
        let ids: Vec<TicketId> = snapshot.iter().map(|t| t.id).collect();
        let request = explicit.then(|| ids.clone());

        let receipt = self.service.submit_run(request).await?;

        self.tickets.exclude(&ids).await;
        self.tickets.clear_selection().await;
        let claimed = self
            .registry
            .write()
            .await
            .claim(receipt.run_id, receipt.status, snapshot);
        self.pollers.start(receipt.run_id).await;

        let source = if explicit { "selected" } else { "all" };
        metrics::RUNS_SUBMITTED.with_label_values(&[source]).inc();
        metrics::TICKETS_CLAIMED.inc_by(claimed as u64);
        info!(
            run_id = receipt.run_id,
            tickets = claimed,
            source,
            "Submitted analysis run"
        );
        Ok(receipt.run_id)
    }

    /// Best-effort crash recovery. Errors are logged and swallowed; a
    /// failed recovery must not block the UI, it only means the ready view
    /// may transiently show processing tickets.
    pub async fn recover(&self) -> RecoveryReport {
        match reconciler::reconcile(
            &self.service,
            &self.registry,
            &self.tickets,
            &self.pollers,
            self.recovery_page_size,
        )
        .await
        {
            Ok(report) => {
                if report.runs_resumed > 0 {
                    info!(
                        runs = report.runs_resumed,
                        tickets = report.tickets_reclaimed,
                        "Recovery complete"
                    );
                }
                report
            }
            Err(e) => {
                warn!(error = %e, "Recovery failed, continuing without in-flight state");
                RecoveryReport::default()
            }
        }
    }

    /// Tickets currently owned by in-flight runs, with their run ids.
    pub async fn processing_tickets(&self) -> Vec<ProcessingTicket> {
        self.registry.read().await.processing_tickets()
    }

    /// Ids of every claimed ticket.
    pub async fn claimed_ids(&self) -> Vec<TicketId> {
        let mut ids: Vec<TicketId> = self.registry.read().await.claimed_ids().into_iter().collect();
        ids.sort_unstable();
        ids
    }

    /// Current snapshot: live pollers and claimed tickets.
    pub async fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            active_runs: self.pollers.active_count().await,
            claimed_tickets: self.registry.read().await.claim_count(),
        }
    }

    /// Whether a run currently has a live poller.
    pub async fn is_polling(&self, run_id: RunId) -> bool {
        self.pollers.is_active(run_id).await
    }

    /// Stop one run's poller without touching its claims.
    pub async fn stop_poller(&self, run_id: RunId) -> bool {
        self.pollers.stop(run_id).await
    }

    /// Stop every poller; used on shutdown. Claims are left as-is; a
    /// later [`recover`](Self::recover) rebuilds them from the server.
    pub async fn stop_all(&self) -> usize {
        self.pollers.stop_all().await
    }
}
