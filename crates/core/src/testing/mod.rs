//! Testing utilities and mock implementations for lifecycle tests.
//!
//! Provides a controllable [`MockTicketService`] so coordinator scenarios
//! can run without a real service.
//!
//! # Example
//!
//! ```rust,ignore
//! use triago_core::testing::{fixtures, MockTicketService};
//!
//! let service = MockTicketService::new();
//! service.seed_tickets(fixtures::ready_tickets(3)).await;
//! service.set_status_sequence(1, vec![RunStatus::Processing, RunStatus::Completed]).await;
//! ```

mod mock_ticket_service;

pub use mock_ticket_service::MockTicketService;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::api::{AnalyzedTicket, NewTicket, Priority, Ticket, TicketId, TicketStatus};

    /// Create a ready ticket with reasonable defaults.
    pub fn ticket(id: TicketId, title: &str) -> Ticket {
        Ticket {
            id,
            title: title.to_string(),
            description: format!("{title} needs attention"),
            created_at: Utc::now(),
            status: TicketStatus::Ready,
        }
    }

    /// Create `n` ready tickets with ids 1..=n.
    pub fn ready_tickets(n: usize) -> Vec<Ticket> {
        (1..=n as TicketId)
            .map(|id| ticket(id, &format!("Ticket {id}")))
            .collect()
    }

    /// Create an analyzed-view projection.
    pub fn analyzed_ticket(id: TicketId, analysis_id: i64) -> AnalyzedTicket {
        AnalyzedTicket {
            id,
            analysis_id,
            title: format!("Ticket {id}"),
            description: format!("Ticket {id} needs attention"),
            category: "general".to_string(),
            priority: Priority::Medium,
            notes: None,
        }
    }

    /// Create a ticket creation request.
    pub fn new_ticket(title: &str) -> NewTicket {
        NewTicket::new(title, format!("{title} needs attention"))
    }
}
