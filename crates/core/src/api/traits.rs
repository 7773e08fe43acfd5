//! Ticket service trait.

use async_trait::async_trait;

use super::types::{
    ActiveRun, AnalysisRun, AnalyzedPage, ApiError, NewTicket, RunId, RunPage, RunReceipt, Ticket,
    TicketId, TicketPage, TicketQuery,
};

/// Interface to the remote ticket/analysis service.
///
/// The service is authoritative for ticket and run state; implementations
/// only transport. Everything the coordinator knows about the world comes
/// through this trait, which is what makes the lifecycle logic testable
/// against [`crate::testing::MockTicketService`].
#[async_trait]
pub trait TicketService: Send + Sync {
    /// Implementation name (for logs).
    fn name(&self) -> &str;

    /// Create a batch of tickets.
    async fn create_tickets(&self, tickets: Vec<NewTicket>) -> Result<Vec<Ticket>, ApiError>;

    /// List tickets, optionally filtered by status.
    async fn list_tickets(&self, query: &TicketQuery) -> Result<TicketPage, ApiError>;

    /// List tickets that have analysis results.
    async fn list_analyzed(&self, page: u32, page_size: u32) -> Result<AnalyzedPage, ApiError>;

    /// Submit an analysis run.
    ///
    /// `None` asks the server to analyze every currently ready ticket.
    async fn submit_run(&self, ticket_ids: Option<Vec<TicketId>>) -> Result<RunReceipt, ApiError>;

    /// Current status of a run and the ticket ids it owns.
    async fn run_status(&self, run_id: RunId) -> Result<ActiveRun, ApiError>;

    /// All runs that have not reached a terminal status.
    async fn active_runs(&self) -> Result<Vec<ActiveRun>, ApiError>;

    /// Paginated run history.
    async fn list_runs(&self, page: u32, page_size: u32) -> Result<RunPage, ApiError>;

    /// Full run record including per-ticket results.
    async fn run_detail(&self, run_id: RunId) -> Result<AnalysisRun, ApiError>;
}
