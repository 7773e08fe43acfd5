//! Types for the analysis run coordinator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{RunId, Ticket};

/// Errors that can occur during coordination.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Ticket service call failed.
    #[error("service error: {0}")]
    Service(#[from] crate::api::ApiError),

    /// Submission requested with nothing to analyze.
    #[error("no tickets to analyze")]
    NothingToAnalyze,
}

/// A ticket currently owned by an in-flight run.
///
/// Local-only bookkeeping; never persisted. The server's ticket status is
/// authoritative, this record exists so the in-flight view can render the
/// ticket and so the ready view can exclude it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingTicket {
    /// The claimed ticket.
    pub ticket: Ticket,
    /// Run that owns the claim.
    pub run_id: RunId,
}

/// Current snapshot of the coordinator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    /// Runs currently tracked with live pollers.
    pub active_runs: usize,
    /// Tickets claimed by in-flight runs.
    pub claimed_tickets: usize,
}

/// Outcome of a recovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Active runs for which pollers were (re)attached.
    pub runs_resumed: usize,
    /// Tickets reclaimed into the registry.
    pub tickets_reclaimed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;

    #[test]
    fn test_error_display() {
        let err = CoordinatorError::NothingToAnalyze;
        assert_eq!(err.to_string(), "no tickets to analyze");

        let err = CoordinatorError::Service(ApiError::Timeout);
        assert_eq!(err.to_string(), "service error: request timed out");
    }

    #[test]
    fn test_status_default() {
        let status = CoordinatorStatus::default();
        assert_eq!(status.active_runs, 0);
        assert_eq!(status.claimed_tickets, 0);
    }
}
