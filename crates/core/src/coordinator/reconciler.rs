//! Crash recovery: rebuild in-flight state from the server.
//!
//! After a restart the client has no claims and no pollers, while the
//! server may still be mid-analysis. The reconciler asks the server which
//! runs are active, rebuilds the registry from them, re-attaches pollers,
//! and hides the reclaimed tickets from the ready view so the two views
//! never show the same ticket.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::{ApiError, Ticket, TicketId, TicketQuery, TicketService, TicketStatus};
use crate::directory::TicketDirectory;
use crate::metrics;

use super::poller::PollerManager;
use super::registry::RunRegistry;
use super::types::RecoveryReport;

/// One recovery pass. Idempotent: claiming is a no-op for runs already in
/// the registry and poller starts are no-ops for runs already polled, so
/// running this twice against unchanged server state changes nothing.
pub(crate) async fn reconcile(
    service: &Arc<dyn TicketService>,
    registry: &Arc<RwLock<RunRegistry>>,
    tickets: &Arc<TicketDirectory>,
    pollers: &PollerManager,
    recovery_page_size: u32,
) -> Result<RecoveryReport, ApiError> {
    let active = service.active_runs().await?;
    if active.is_empty() {
        debug!("No active analysis runs to recover");
        return Ok(RecoveryReport::default());
    }

    // One large page approximates "all processing tickets".
    let query =
        TicketQuery::page(1, recovery_page_size).with_status(TicketStatus::Processing);
    let processing = service.list_tickets(&query).await?;
    let by_id: HashMap<TicketId, Ticket> =
        processing.items.into_iter().map(|t| (t.id, t)).collect();

    let mut report = RecoveryReport::default();
    for run in active {
        if run.status.is_terminal() {
            continue;
        }

        let owned: Vec<Ticket> = run
            .ticket_ids
            .iter()
            .filter_map(|id| by_id.get(id).cloned())
            .collect();

        let claimed = registry
            .write()
            .await
            .claim(run.run_id, run.status, owned);
        if claimed > 0 {
            metrics::TICKETS_CLAIMED.inc_by(claimed as u64);
        }
        report.tickets_reclaimed += claimed;

        pollers.start(run.run_id).await;
        report.runs_resumed += 1;
        info!(
            run_id = run.run_id,
            status = run.status.as_str(),
            tickets = claimed,
            "Resumed tracking analysis run"
        );
    }

    // Keep the ready view disjoint from every reconstructed claim.
    let claimed_ids: Vec<TicketId> = registry.read().await.claimed_ids().into_iter().collect();
    tickets.exclude(&claimed_ids).await;

    metrics::RUNS_RECOVERED.inc_by(report.runs_resumed as u64);
    Ok(report)
}
