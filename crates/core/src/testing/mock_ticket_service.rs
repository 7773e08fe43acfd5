//! Mock ticket service for testing.

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::api::{
    ActiveRun, AnalysisRun, AnalyzedPage, AnalyzedTicket, ApiError, NewTicket, Priority, RunId,
    RunPage, RunReceipt, RunStatus, RunSummary, Ticket, TicketAnalysis, TicketId, TicketPage,
    TicketQuery, TicketService, TicketStatus,
};

/// Internal state for a mock analysis run.
#[derive(Debug, Clone)]
struct MockRun {
    id: RunId,
    created_at: chrono::DateTime<Utc>,
    status: RunStatus,
    ticket_ids: Vec<TicketId>,
    summary: Option<String>,
    ticket_analyses: Vec<TicketAnalysis>,
}

/// Mock implementation of the [`TicketService`] trait.
///
/// Emulates the server's side of the run lifecycle so coordinator tests can
/// drive complete scenarios:
/// - submitted runs mark their tickets `processing`
/// - a scripted status sequence per run (each status check consumes one
///   entry, the last entry sticks)
/// - reaching `completed` moves the run's tickets to `analyzed` and
///   produces analyzed projections; reaching `failed` reverts them to
///   `ready`
/// - one-shot error injection for any call
///
/// # Example
///
/// ```rust,ignore
/// let service = MockTicketService::new();
/// service.seed_tickets(vec![fixtures::ticket(5, "a"), fixtures::ticket(7, "b")]).await;
///
/// let receipt = service.submit_run(Some(vec![5, 7])).await?;
/// service
///     .set_status_sequence(receipt.run_id, vec![RunStatus::Processing, RunStatus::Completed])
///     .await;
///
/// service.run_status(receipt.run_id).await?; // processing
/// service.run_status(receipt.run_id).await?; // completed, tickets now analyzed
/// ```
#[derive(Debug, Default)]
pub struct MockTicketService {
    tickets: RwLock<Vec<Ticket>>,
    analyzed: RwLock<Vec<AnalyzedTicket>>,
    runs: RwLock<BTreeMap<RunId, MockRun>>,
    status_scripts: RwLock<HashMap<RunId, VecDeque<RunStatus>>>,
    /// Recorded submit_run calls (the explicit id list, if any).
    submitted: RwLock<Vec<Option<Vec<TicketId>>>>,
    /// If set, the next operation fails with this error.
    next_error: RwLock<Option<ApiError>>,
    next_ticket_id: RwLock<TicketId>,
    next_run_id: RwLock<RunId>,
    next_analysis_id: RwLock<i64>,
}

impl MockTicketService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add tickets to the mock server's store as-is.
    pub async fn seed_tickets(&self, tickets: Vec<Ticket>) {
        let mut store = self.tickets.write().await;
        for ticket in &tickets {
            let mut next_id = self.next_ticket_id.write().await;
            *next_id = (*next_id).max(ticket.id);
        }
        store.extend(tickets);
    }

    /// Add analyzed projections directly (for view tests).
    pub async fn seed_analyzed(&self, tickets: Vec<AnalyzedTicket>) {
        self.analyzed.write().await.extend(tickets);
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ApiError) {
        *self.next_error.write().await = Some(error);
    }

    /// Script the statuses returned by successive `run_status` calls for a
    /// run. Each call consumes one entry; the final entry keeps repeating.
    pub async fn set_status_sequence(&self, run_id: RunId, statuses: Vec<RunStatus>) {
        self.status_scripts
            .write()
            .await
            .insert(run_id, statuses.into());
    }

    /// Mark a run completed: tickets become `analyzed` with results.
    pub async fn complete_run(&self, run_id: RunId) {
        let ticket_ids = {
            let mut runs = self.runs.write().await;
            let Some(run) = runs.get_mut(&run_id) else {
                return;
            };
            run.status = RunStatus::Completed;
            run.summary = Some(format!("Analyzed {} tickets", run.ticket_ids.len()));
            run.ticket_ids.clone()
        };

        let mut analyses = Vec::with_capacity(ticket_ids.len());
        {
            let mut tickets = self.tickets.write().await;
            let mut analyzed = self.analyzed.write().await;
            for ticket in tickets.iter_mut().filter(|t| ticket_ids.contains(&t.id)) {
                ticket.status = TicketStatus::Analyzed;
                let analysis_id = {
                    let mut next = self.next_analysis_id.write().await;
                    *next += 1;
                    *next
                };
                analyzed.push(AnalyzedTicket {
                    id: ticket.id,
                    analysis_id,
                    title: ticket.title.clone(),
                    description: ticket.description.clone(),
                    category: "general".to_string(),
                    priority: Priority::Medium,
                    notes: None,
                });
                analyses.push(TicketAnalysis {
                    id: analysis_id,
                    ticket_id: ticket.id,
                    category: "general".to_string(),
                    priority: Priority::Medium,
                    notes: None,
                    ticket: Some(ticket.clone()),
                });
            }
        }

        if let Some(run) = self.runs.write().await.get_mut(&run_id) {
            run.ticket_analyses = analyses;
        }
    }

    /// Mark a run failed: its tickets revert to `ready`.
    pub async fn fail_run(&self, run_id: RunId) {
        let ticket_ids = {
            let mut runs = self.runs.write().await;
            let Some(run) = runs.get_mut(&run_id) else {
                return;
            };
            run.status = RunStatus::Failed;
            run.ticket_ids.clone()
        };

        let mut tickets = self.tickets.write().await;
        for ticket in tickets.iter_mut().filter(|t| ticket_ids.contains(&t.id)) {
            ticket.status = TicketStatus::Ready;
        }
    }

    /// Recorded `submit_run` calls.
    pub async fn submitted_runs(&self) -> Vec<Option<Vec<TicketId>>> {
        self.submitted.read().await.clone()
    }

    /// Current status of a ticket in the mock store.
    pub async fn ticket_status(&self, ticket_id: TicketId) -> Option<TicketStatus> {
        self.tickets
            .read()
            .await
            .iter()
            .find(|t| t.id == ticket_id)
            .map(|t| t.status)
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<ApiError> {
        self.next_error.write().await.take()
    }

    fn paginate<T: Clone>(items: &[T], page: u32, page_size: u32) -> Vec<T> {
        let start = (page.saturating_sub(1) as usize) * page_size as usize;
        items
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TicketService for MockTicketService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_tickets(&self, tickets: Vec<NewTicket>) -> Result<Vec<Ticket>, ApiError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let mut created = Vec::with_capacity(tickets.len());
        let mut store = self.tickets.write().await;
        for new in tickets {
            let id = {
                let mut next = self.next_ticket_id.write().await;
                *next += 1;
                *next
            };
            let ticket = Ticket {
                id,
                title: new.title,
                description: new.description,
                created_at: Utc::now(),
                status: TicketStatus::Ready,
            };
            store.push(ticket.clone());
            created.push(ticket);
        }
        Ok(created)
    }

    async fn list_tickets(&self, query: &TicketQuery) -> Result<TicketPage, ApiError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let tickets = self.tickets.read().await;
        let filtered: Vec<Ticket> = tickets
            .iter()
            .filter(|t| query.status.is_none_or(|s| t.status == s))
            .cloned()
            .collect();

        Ok(TicketPage {
            items: Self::paginate(&filtered, query.page, query.page_size),
            page: query.page,
            page_size: query.page_size,
        })
    }

    async fn list_analyzed(&self, page: u32, page_size: u32) -> Result<AnalyzedPage, ApiError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let analyzed = self.analyzed.read().await;
        Ok(AnalyzedPage {
            items: Self::paginate(&analyzed, page, page_size),
            page,
            page_size,
        })
    }

    async fn submit_run(&self, ticket_ids: Option<Vec<TicketId>>) -> Result<RunReceipt, ApiError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.submitted.write().await.push(ticket_ids.clone());

        // Empty or omitted list means "all currently ready", resolved here
        // on the server's view, like the real service.
        let mut tickets = self.tickets.write().await;
        let resolved: Vec<TicketId> = match ticket_ids {
            Some(ids) if !ids.is_empty() => ids,
            _ => tickets
                .iter()
                .filter(|t| t.status == TicketStatus::Ready)
                .map(|t| t.id)
                .collect(),
        };

        for ticket in tickets.iter_mut().filter(|t| resolved.contains(&t.id)) {
            ticket.status = TicketStatus::Processing;
        }
        drop(tickets);

        let run_id = {
            let mut next = self.next_run_id.write().await;
            *next += 1;
            *next
        };
        self.runs.write().await.insert(
            run_id,
            MockRun {
                id: run_id,
                created_at: Utc::now(),
                status: RunStatus::Pending,
                ticket_ids: resolved,
                summary: None,
                ticket_analyses: Vec::new(),
            },
        );

        Ok(RunReceipt {
            run_id,
            status: RunStatus::Pending,
        })
    }

    async fn run_status(&self, run_id: RunId) -> Result<ActiveRun, ApiError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        if !self.runs.read().await.contains_key(&run_id) {
            return Err(ApiError::Http {
                status: 404,
                message: "Analysis run not found".to_string(),
            });
        }

        // Advance the scripted status, if any, applying server-side effects
        // for terminal entries.
        let scripted = {
            let mut scripts = self.status_scripts.write().await;
            scripts.get_mut(&run_id).and_then(|script| {
                if script.len() > 1 {
                    script.pop_front()
                } else {
                    script.front().copied()
                }
            })
        };
        if let Some(status) = scripted {
            match status {
                RunStatus::Completed => self.complete_run(run_id).await,
                RunStatus::Failed => self.fail_run(run_id).await,
                other => {
                    if let Some(run) = self.runs.write().await.get_mut(&run_id) {
                        run.status = other;
                    }
                }
            }
        }

        let runs = self.runs.read().await;
        let run = runs.get(&run_id).expect("run existed above");
        Ok(ActiveRun {
            run_id,
            status: run.status,
            ticket_ids: run.ticket_ids.clone(),
        })
    }

    async fn active_runs(&self) -> Result<Vec<ActiveRun>, ApiError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let runs = self.runs.read().await;
        Ok(runs
            .values()
            .filter(|run| !run.status.is_terminal())
            .map(|run| ActiveRun {
                run_id: run.id,
                status: run.status,
                ticket_ids: run.ticket_ids.clone(),
            })
            .collect())
    }

    async fn list_runs(&self, page: u32, page_size: u32) -> Result<RunPage, ApiError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let runs = self.runs.read().await;
        // Newest first, matching the run-history view.
        let summaries: Vec<RunSummary> = runs
            .values()
            .rev()
            .map(|run| RunSummary {
                id: run.id,
                created_at: run.created_at,
                ticket_count: run.ticket_ids.len() as u32,
                summary: run.summary.clone(),
            })
            .collect();

        Ok(RunPage {
            items: Self::paginate(&summaries, page, page_size),
            page,
            page_size,
        })
    }

    async fn run_detail(&self, run_id: RunId) -> Result<AnalysisRun, ApiError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let runs = self.runs.read().await;
        let run = runs.get(&run_id).ok_or_else(|| ApiError::Http {
            status: 404,
            message: "Analysis run not found".to_string(),
        })?;
        Ok(AnalysisRun {
            id: run.id,
            created_at: run.created_at,
            status: run.status,
            summary: run.summary.clone(),
            ticket_analyses: run.ticket_analyses.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_submit_marks_tickets_processing() {
        let service = MockTicketService::new();
        service
            .seed_tickets(vec![fixtures::ticket(1, "a"), fixtures::ticket(2, "b")])
            .await;

        let receipt = service.submit_run(Some(vec![1])).await.unwrap();
        assert_eq!(receipt.status, RunStatus::Pending);
        assert_eq!(
            service.ticket_status(1).await,
            Some(TicketStatus::Processing)
        );
        assert_eq!(service.ticket_status(2).await, Some(TicketStatus::Ready));
    }

    #[tokio::test]
    async fn test_submit_without_ids_takes_all_ready() {
        let service = MockTicketService::new();
        service
            .seed_tickets(vec![fixtures::ticket(1, "a"), fixtures::ticket(2, "b")])
            .await;

        let receipt = service.submit_run(None).await.unwrap();
        let status = service.run_status(receipt.run_id).await.unwrap();
        assert_eq!(status.ticket_ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_scripted_status_sequence_sticks_on_last() {
        let service = MockTicketService::new();
        service.seed_tickets(vec![fixtures::ticket(1, "a")]).await;
        let receipt = service.submit_run(Some(vec![1])).await.unwrap();
        service
            .set_status_sequence(
                receipt.run_id,
                vec![RunStatus::Pending, RunStatus::Processing, RunStatus::Completed],
            )
            .await;

        let statuses: Vec<RunStatus> = [
            service.run_status(receipt.run_id).await.unwrap().status,
            service.run_status(receipt.run_id).await.unwrap().status,
            service.run_status(receipt.run_id).await.unwrap().status,
            service.run_status(receipt.run_id).await.unwrap().status,
        ]
        .to_vec();
        assert_eq!(
            statuses,
            vec![
                RunStatus::Pending,
                RunStatus::Processing,
                RunStatus::Completed,
                RunStatus::Completed
            ]
        );

        // Completion moved the ticket to analyzed.
        assert_eq!(service.ticket_status(1).await, Some(TicketStatus::Analyzed));
        let analyzed = service.list_analyzed(1, 10).await.unwrap();
        assert_eq!(analyzed.items.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_run_reverts_tickets() {
        let service = MockTicketService::new();
        service.seed_tickets(vec![fixtures::ticket(1, "a")]).await;
        let receipt = service.submit_run(Some(vec![1])).await.unwrap();

        service.fail_run(receipt.run_id).await;
        assert_eq!(service.ticket_status(1).await, Some(TicketStatus::Ready));
        assert!(service.active_runs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_injection_is_one_shot() {
        let service = MockTicketService::new();
        service.set_next_error(ApiError::Timeout).await;

        assert!(service.active_runs().await.is_err());
        assert!(service.active_runs().await.is_ok());
    }

    #[tokio::test]
    async fn test_run_status_unknown_run_is_404() {
        let service = MockTicketService::new();
        let err = service.run_status(99).await.unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 404, .. }));
    }
}
