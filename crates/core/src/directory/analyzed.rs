//! Analyzed-ticket directory: the paginated "already analyzed" projection.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::api::{AnalyzedTicket, TicketService};

use super::types::PageCursor;

#[derive(Debug)]
struct AnalyzedViewState {
    tickets: Vec<AnalyzedTicket>,
    cursor: PageCursor,
    loading: bool,
    error: Option<String>,
}

/// Read-only projection of analyzed tickets. It holds no lifecycle state of
/// its own; pollers push refreshes into it when runs complete.
pub struct AnalyzedDirectory {
    service: Arc<dyn TicketService>,
    state: RwLock<AnalyzedViewState>,
}

impl AnalyzedDirectory {
    pub fn new(service: Arc<dyn TicketService>, page_size: u32) -> Self {
        Self {
            service,
            state: RwLock::new(AnalyzedViewState {
                tickets: Vec::new(),
                cursor: PageCursor::first(page_size),
                loading: false,
                error: None,
            }),
        }
    }

    /// Load one page, replacing the visible set. A failed load keeps the
    /// previous items and records the error.
    pub async fn load_page(&self, page: u32) {
        let page_size = {
            let mut state = self.state.write().await;
            state.loading = true;
            state.cursor.page_size
        };

        let result = self.service.list_analyzed(page, page_size).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(list) => {
                let returned = list.items.len();
                state.tickets = list.items;
                state.cursor.observe(page, returned);
                state.error = None;
                debug!(page, returned, "Loaded analyzed tickets");
            }
            Err(e) => {
                warn!(page, error = %e, "Failed to load analyzed tickets");
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

    pub async fn tickets(&self) -> Vec<AnalyzedTicket> {
        self.state.read().await.tickets.clone()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::testing::{fixtures, MockTicketService};

    #[tokio::test]
    async fn test_load_and_paginate() {
        let service = Arc::new(MockTicketService::new());
        service
            .seed_analyzed((1..=12).map(|i| fixtures::analyzed_ticket(i, i)).collect())
            .await;

        let directory = AnalyzedDirectory::new(service, 10);
        directory.load_page(1).await;
        assert_eq!(directory.tickets().await.len(), 10);
        assert!(directory.has_more().await);

        directory.next_page().await;
        assert_eq!(directory.page().await, 2);
        assert_eq!(directory.tickets().await.len(), 2);
        assert!(!directory.has_more().await);

        directory.prev_page().await;
        assert_eq!(directory.page().await, 1);
    }

    #[tokio::test]
    async fn test_error_preserves_items() {
        let service = Arc::new(MockTicketService::new());
        service
            .seed_analyzed(vec![fixtures::analyzed_ticket(1, 1)])
            .await;

        let directory = AnalyzedDirectory::new(service.clone(), 10);
        directory.load_page(1).await;
        assert_eq!(directory.tickets().await.len(), 1);

        service.set_next_error(ApiError::Timeout).await;
        directory.refresh().await;
        assert_eq!(directory.tickets().await.len(), 1);
        assert!(directory.error().await.is_some());

        directory.clear_error().await;
        assert!(directory.error().await.is_none());
    }
}
