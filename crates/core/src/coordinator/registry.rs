//! Run registry: per-run claims over in-flight tickets.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::api::{RunId, RunStatus, Ticket, TicketId};

use super::types::ProcessingTicket;

/// Claims held by one in-flight run.
#[derive(Debug, Clone)]
struct RunClaims {
    status: RunStatus,
    tickets: Vec<Ticket>,
}

/// Tracks, per run id, the last observed status and the tickets the run
/// owns while in flight.
///
/// Invariant: a ticket id is claimed by at most one run at any time.
/// Claiming is idempotent per run id, so re-running recovery against
/// unchanged server state leaves the claim set unchanged.
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: HashMap<RunId, RunClaims>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record claims for a run.
    ///
    /// A run id that is already registered is left untouched. Tickets
    /// already claimed by a different run are skipped with a warning rather
    /// than double-claimed. Returns the number of tickets actually claimed.
    pub fn claim(&mut self, run_id: RunId, status: RunStatus, tickets: Vec<Ticket>) -> usize {
        if self.runs.contains_key(&run_id) {
            debug!(run_id, "Run already registered, keeping existing claims");
            return 0;
        }

        let already_claimed = self.claimed_ids();
        let mut accepted = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            if already_claimed.contains(&ticket.id) {
                warn!(
                    run_id,
                    ticket_id = ticket.id,
                    "Ticket already claimed by another run, skipping"
                );
                continue;
            }
            accepted.push(ticket);
        }

        let count = accepted.len();
        self.runs.insert(
            run_id,
            RunClaims {
                status,
                tickets: accepted,
            },
        );
        count
    }

    /// Release all claims for a run, returning the tickets that were held.
    /// Unknown run ids release nothing.
    pub fn release(&mut self, run_id: RunId) -> Vec<Ticket> {
        match self.runs.remove(&run_id) {
            Some(claims) => claims.tickets,
            None => Vec::new(),
        }
    }

    /// Record the latest status observed for a run.
    pub fn set_status(&mut self, run_id: RunId, status: RunStatus) {
        if let Some(claims) = self.runs.get_mut(&run_id) {
            claims.status = status;
        }
    }

    pub fn contains(&self, run_id: RunId) -> bool {
        self.runs.contains_key(&run_id)
    }

    /// Whether any run currently claims the given ticket.
    pub fn is_claimed(&self, ticket_id: TicketId) -> bool {
        self.runs
            .values()
            .any(|claims| claims.tickets.iter().any(|t| t.id == ticket_id))
    }

    /// Every claimed ticket id, across all runs.
    pub fn claimed_ids(&self) -> HashSet<TicketId> {
        self.runs
            .values()
            .flat_map(|claims| claims.tickets.iter().map(|t| t.id))
            .collect()
    }

    /// Ticket ids claimed by one run.
    pub fn claimed_for(&self, run_id: RunId) -> Vec<TicketId> {
        self.runs
            .get(&run_id)
            .map(|claims| claims.tickets.iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }

    /// Flattened view of all in-flight tickets, ordered by run then ticket.
    pub fn processing_tickets(&self) -> Vec<ProcessingTicket> {
        let mut out: Vec<ProcessingTicket> = self
            .runs
            .iter()
            .flat_map(|(run_id, claims)| {
                claims.tickets.iter().map(|ticket| ProcessingTicket {
                    ticket: ticket.clone(),
                    run_id: *run_id,
                })
            })
            .collect();
        out.sort_by_key(|p| (p.run_id, p.ticket.id));
        out
    }

    /// Ids of all tracked runs, ascending.
    pub fn active_run_ids(&self) -> Vec<RunId> {
        let mut ids: Vec<RunId> = self.runs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of tracked runs.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Number of claimed tickets across all runs.
    pub fn claim_count(&self) -> usize {
        self.runs.values().map(|c| c.tickets.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
