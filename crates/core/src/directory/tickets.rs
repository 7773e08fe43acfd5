//! Ready-ticket directory: the paginated "ready to analyze" view.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::api::{ApiError, NewTicket, Ticket, TicketId, TicketQuery, TicketService, TicketStatus};

use super::types::PageCursor;

#[derive(Debug)]
struct TicketViewState {
    tickets: Vec<Ticket>,
    cursor: PageCursor,
    loading: bool,
    error: Option<String>,
    /// Selected ids in toggle order.
    selected: Vec<TicketId>,
    /// Ids claimed by in-flight runs, hidden from this view until released.
    excluded: HashSet<TicketId>,
}

/// The ready-ticket view: one page of tickets the user can select and
/// submit for analysis.
///
/// Claimed tickets are excluded locally the moment a run is submitted
/// (optimistic transition); the server's listing remains authoritative and
/// wins on the next load.
pub struct TicketDirectory {
    service: Arc<dyn TicketService>,
    state: RwLock<TicketViewState>,
}

impl TicketDirectory {
    pub fn new(service: Arc<dyn TicketService>, page_size: u32) -> Self {
        Self {
            service,
            state: RwLock::new(TicketViewState {
                tickets: Vec::new(),
                cursor: PageCursor::first(page_size),
                loading: false,
                error: None,
                selected: Vec::new(),
                excluded: HashSet::new(),
            }),
        }
    }

    /// Load one page, replacing the visible set.
    ///
    /// A failed load keeps whatever was displayed before and records the
    /// error instead of blanking the view.
    pub async fn load_page(&self, page: u32) {
        let page_size = {
            let mut state = self.state.write().await;
            state.loading = true;
            state.cursor.page_size
        };

        let query = TicketQuery::page(page, page_size).with_status(TicketStatus::Ready);
        let result = self.service.list_tickets(&query).await;

        let mut state = self.state.write().await;
        let state = &mut *state;
        state.loading = false;
        match result {
            Ok(list) => {
                let returned = list.items.len();
                state.tickets = list
                    .items
                    .into_iter()
                    .filter(|t| !state.excluded.contains(&t.id))
                    .collect();
                state.cursor.observe(page, returned);
                state.error = None;
                let visible: HashSet<TicketId> = state.tickets.iter().map(|t| t.id).collect();
                state.selected.retain(|id| visible.contains(id));
                debug!(page, returned, "Loaded ready tickets");
            }
            Err(e) => {
                warn!(page, error = %e, "Failed to load ready tickets");
                state.error = Some(e.to_string());
            }
        }
    }

    /// Reload the current page.
    pub async fn refresh(&self) {
        let page = self.state.read().await.cursor.page;
        self.load_page(page).await;
    }

    pub async fn next_page(&self) {
        let next = self.state.read().await.cursor.next();
        if let Some(page) = next {
            self.load_page(page).await;
        }
    }

    pub async fn prev_page(&self) {
        let prev = self.state.read().await.cursor.prev();
        if let Some(page) = prev {
            self.load_page(page).await;
        }
    }

    /// Create tickets on the server, then reload from the first page so the
    /// new tickets are visible with consistent pagination.
    pub async fn create_tickets(&self, tickets: Vec<NewTicket>) -> Result<Vec<Ticket>, ApiError> {
        match self.service.create_tickets(tickets).await {
            Ok(created) => {
                self.load_page(1).await;
                Ok(created)
            }
            Err(e) => {
                self.state.write().await.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Toggle a ticket in or out of the selection.
    pub async fn toggle_selection(&self, ticket_id: TicketId) {
        let mut state = self.state.write().await;
        if let Some(pos) = state.selected.iter().position(|id| *id == ticket_id) {
            state.selected.remove(pos);
        } else if state.tickets.iter().any(|t| t.id == ticket_id) {
            state.selected.push(ticket_id);
        }
    }

    pub async fn clear_selection(&self) {
        self.state.write().await.selected.clear();
    }

    /// Selected ids in toggle order.
    pub async fn selected_ids(&self) -> Vec<TicketId> {
        self.state.read().await.selected.clone()
    }

    /// Full records for the current selection, in toggle order.
    pub async fn selected_tickets(&self) -> Vec<Ticket> {
        let state = self.state.read().await;
        state
            .selected
            .iter()
            .filter_map(|id| state.tickets.iter().find(|t| t.id == *id).cloned())
            .collect()
    }

    /// Snapshot of the currently visible ready tickets.
    pub async fn visible_tickets(&self) -> Vec<Ticket> {
        self.state.read().await.tickets.clone()
    }

    /// Hide the given ids from this view (claimed by an in-flight run).
    /// Also drops them from the selection.
    pub async fn exclude(&self, ids: &[TicketId]) {
        if ids.is_empty() {
            return;
        }
        let mut state = self.state.write().await;
        let state = &mut *state;
        state.excluded.extend(ids.iter().copied());
        state.tickets.retain(|t| !state.excluded.contains(&t.id));
        state.selected.retain(|id| !state.excluded.contains(id));
    }

    /// Stop hiding the given ids (their run released its claims). They
    /// reappear only if the server still lists them as ready.
    pub async fn readmit(&self, ids: &[TicketId]) {
        if ids.is_empty() {
            return;
        }
        let mut state = self.state.write().await;
        for id in ids {
            state.excluded.remove(id);
        }
    }

    /// Record a user-visible error on this view.
    pub async fn set_error(&self, message: impl Into<String>) {
        self.state.write().await.error = Some(message.into());
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn page(&self) -> u32 {
        self.state.read().await.cursor.page
    }

    pub async fn has_more(&self) -> bool {
        self.state.read().await.cursor.has_more
    }
}
