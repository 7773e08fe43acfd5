//! Wire types for the ticket/analysis service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server-assigned ticket identifier.
pub type TicketId = i64;

/// Server-assigned analysis run identifier.
pub type RunId = i64;

/// Errors from the ticket/analysis service client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Could not connect to the service.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The service returned a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Any other transport-level failure.
    #[error("api error: {0}")]
    Other(String),
}

/// Status of a ticket as reported by the server.
///
/// Transitions are driven entirely server-side; the client only observes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Waiting to be included in an analysis run.
    Ready,
    /// Owned by an in-flight analysis run.
    Processing,
    /// Analysis results available.
    Analyzed,
    /// The last run covering this ticket failed.
    Failed,
}

impl TicketStatus {
    /// Returns the status as its wire string (for query parameters).
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Ready => "ready",
            TicketStatus::Processing => "processing",
            TicketStatus::Analyzed => "analyzed",
            TicketStatus::Failed => "failed",
        }
    }
}

/// Status of an analysis run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RunStatus {
    /// Returns true if no further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Returns the status as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Processing => "processing",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

/// Analysis priority assigned to a ticket by the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A support ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: TicketStatus,
}

/// Request body for creating a ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
}

impl NewTicket {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// One page of tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketPage {
    pub items: Vec<Ticket>,
    pub page: u32,
    pub page_size: u32,
}

/// Query parameters for listing tickets.
#[derive(Debug, Clone, Default)]
pub struct TicketQuery {
    pub page: u32,
    pub page_size: u32,
    pub status: Option<TicketStatus>,
}

impl TicketQuery {
    /// Create a query for the given page.
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            status: None,
        }
    }

    /// Restrict the query to tickets in the given status.
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// A ticket joined with its analysis result, as shown in the analyzed view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedTicket {
    /// Ticket id.
    pub id: TicketId,
    /// Id of the ticket-analysis row (unique per run membership).
    pub analysis_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One page of analyzed tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedPage {
    pub items: Vec<AnalyzedTicket>,
    pub page: u32,
    pub page_size: u32,
}

/// Per-ticket result inside a run detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketAnalysis {
    pub id: i64,
    pub ticket_id: TicketId,
    pub category: String,
    pub priority: Priority,
    #[serde(default)]
    pub notes: Option<String>,
    /// The underlying ticket record, when the server expands it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
}

/// Full analysis run record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub id: RunId,
    pub created_at: DateTime<Utc>,
    pub status: RunStatus,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub ticket_analyses: Vec<TicketAnalysis>,
}

/// Run listing entry (no per-ticket results).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: RunId,
    pub created_at: DateTime<Utc>,
    pub ticket_count: u32,
    #[serde(default)]
    pub summary: Option<String>,
}

/// One page of run summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPage {
    pub items: Vec<RunSummary>,
    pub page: u32,
    pub page_size: u32,
}

/// Reply from submitting a run: the new run id and its initial status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReceipt {
    pub run_id: RunId,
    pub status: RunStatus,
}

/// Status-endpoint reply: a run's current status and the ticket ids it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveRun {
    pub run_id: RunId,
    pub status: RunStatus,
    pub ticket_ids: Vec<TicketId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_terminal() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Processing.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_wire_strings() {
        assert_eq!(TicketStatus::Ready.as_str(), "ready");
        assert_eq!(TicketStatus::Processing.as_str(), "processing");
        assert_eq!(RunStatus::Completed.as_str(), "completed");

        let json = serde_json::to_string(&TicketStatus::Analyzed).unwrap();
        assert_eq!(json, "\"analyzed\"");
        let parsed: RunStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, RunStatus::Failed);
    }

    #[test]
    fn test_ticket_round_trip() {
        let ticket = Ticket {
            id: 42,
            title: "Login broken".to_string(),
            description: "Cannot sign in since Tuesday".to_string(),
            created_at: Utc::now(),
            status: TicketStatus::Ready,
        };
        let json = serde_json::to_string(&ticket).unwrap();
        let parsed: Ticket = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ticket);
    }

    #[test]
    fn test_active_run_decodes_without_optional_fields() {
        let json = r#"{"run_id": 7, "status": "processing", "ticket_ids": [5, 7]}"#;
        let active: ActiveRun = serde_json::from_str(json).unwrap();
        assert_eq!(active.run_id, 7);
        assert_eq!(active.ticket_ids, vec![5, 7]);
        assert!(!active.status.is_terminal());
    }

    #[test]
    fn test_ticket_query_builder() {
        let query = TicketQuery::page(2, 25).with_status(TicketStatus::Processing);
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, 25);
        assert_eq!(query.status, Some(TicketStatus::Processing));
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Http {
            status: 404,
            message: "Analysis run not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: Analysis run not found");
    }
}
