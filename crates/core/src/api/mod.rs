//! Client interface to the remote ticket/analysis service.
//!
//! The service owns all persistent state; this module only defines the wire
//! shapes, the [`TicketService`] trait, and the HTTP implementation.

mod http;
mod traits;
mod types;

pub use http::HttpTicketService;
pub use traits::TicketService;
pub use types::{
    ActiveRun, AnalysisRun, AnalyzedPage, AnalyzedTicket, ApiError, NewTicket, Priority, RunId,
    RunPage, RunReceipt, RunStatus, RunSummary, Ticket, TicketAnalysis, TicketId, TicketPage,
    TicketQuery, TicketStatus,
};
