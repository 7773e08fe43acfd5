//! Run-history directory: paginated run summaries plus on-demand detail.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{AnalysisRun, ApiError, RunId, RunSummary, TicketService};
use crate::coordinator::RunEvents;

use super::types::PageCursor;

#[derive(Debug)]
struct RunViewState {
    runs: Vec<RunSummary>,
    cursor: PageCursor,
    loading: bool,
    error: Option<String>,
}

/// Paginated run history. Instead of polling, it can follow the run event
/// broadcast and reload itself whenever any run reaches a terminal state.
pub struct RunDirectory {
    service: Arc<dyn TicketService>,
    state: RwLock<RunViewState>,
}

impl RunDirectory {
    pub fn new(service: Arc<dyn TicketService>, page_size: u32) -> Self {
        Self {
            service,
            state: RwLock::new(RunViewState {
                runs: Vec::new(),
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

        let result = self.service.list_runs(page, page_size).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(list) => {
                let returned = list.items.len();
                state.runs = list.items;
                state.cursor.observe(page, returned);
                state.error = None;
                debug!(page, returned, "Loaded analysis runs");
            }
            Err(e) => {
                warn!(page, error = %e, "Failed to load analysis runs");
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

    /// Fetch the full record for one run, including per-ticket results.
    pub async fn run_detail(&self, run_id: RunId) -> Result<AnalysisRun, ApiError> {
        self.service.run_detail(run_id).await
    }

    /// Follow the run event broadcast, reloading the current page after
    /// every terminal transition. Returns the listener task; it ends when
    /// the event channel closes.
    pub fn watch_events(self: &Arc<Self>, events: &RunEvents) -> JoinHandle<()> {
        let mut rx = events.subscribe();
        let directory = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        debug!(run_id = event.run_id(), "Run event received, refreshing run history");
                        directory.refresh().await;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Run event listener lagged, refreshing once");
                        directory.refresh().await;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    pub async fn runs(&self) -> Vec<RunSummary> {
        self.state.read().await.runs.clone()
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
    use crate::coordinator::RunEvent;
    use crate::testing::MockTicketService;

    #[tokio::test]
    async fn test_load_runs() {
        let service = Arc::new(MockTicketService::new());
        service.submit_run(Some(vec![])).await.unwrap();
        service.submit_run(Some(vec![])).await.unwrap();

        let directory = RunDirectory::new(service, 10);
        directory.load_page(1).await;
        assert_eq!(directory.runs().await.len(), 2);
        assert!(!directory.has_more().await);
    }

    #[tokio::test]
    async fn test_watch_events_refreshes() {
        let service = Arc::new(MockTicketService::new());
        let directory = Arc::new(RunDirectory::new(service.clone(), 10));
        directory.load_page(1).await;
        assert!(directory.runs().await.is_empty());

        let events = RunEvents::new(8);
        let listener = directory.watch_events(&events);

        // A run appears server-side, then its completion is broadcast.
        let receipt = service.submit_run(Some(vec![])).await.unwrap();
        events.publish(RunEvent::Completed {
            run_id: receipt.run_id,
        });

        // Give the listener a moment to process the event.
        for _ in 0..50 {
            if !directory.runs().await.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(directory.runs().await.len(), 1);

        listener.abort();
    }
}
