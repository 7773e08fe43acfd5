//! HTTP implementation of the ticket service client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ServiceConfig;

use super::types::{
    ActiveRun, AnalysisRun, AnalyzedPage, ApiError, NewTicket, RunId, RunPage, RunReceipt, Ticket,
    TicketId, TicketPage, TicketQuery,
};
use super::TicketService;

/// Body for `POST /api/analyze`.
///
/// The field name is camelCase on the wire; omitting it means
/// "all currently ready tickets", resolved server-side.
#[derive(Debug, Serialize)]
struct AnalyzeRequest {
    #[serde(rename = "ticketIds", skip_serializing_if = "Option::is_none")]
    ticket_ids: Option<Vec<TicketId>>,
}

/// Ticket service client over HTTP.
pub struct HttpTicketService {
    client: Client,
    base_url: String,
}

impl HttpTicketService {
    /// Create a new client from service configuration.
    pub fn new(config: &ServiceConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() {
            ApiError::ConnectionFailed(e.to_string())
        } else {
            ApiError::Other(e.to_string())
        }
    }

    /// Send a request, fail on non-success status, decode the JSON body.
    async fn exchange<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn check_status(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status,
            message: body.chars().take(200).collect(),
        })
    }
}

#[async_trait]
impl TicketService for HttpTicketService {
    fn name(&self) -> &str {
        "http"
    }

    async fn create_tickets(&self, tickets: Vec<NewTicket>) -> Result<Vec<Ticket>, ApiError> {
        debug!(count = tickets.len(), "Creating tickets");
        Self::exchange(self.client.post(self.url("/api/tickets")).json(&tickets)).await
    }

    async fn list_tickets(&self, query: &TicketQuery) -> Result<TicketPage, ApiError> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("page_size", query.page_size.to_string()),
        ];
        if let Some(status) = query.status {
            params.push(("status", status.as_str().to_string()));
        }
        Self::exchange(self.client.get(self.url("/api/tickets")).query(&params)).await
    }

    async fn list_analyzed(&self, page: u32, page_size: u32) -> Result<AnalyzedPage, ApiError> {
        let params = [("page", page), ("page_size", page_size)];
        Self::exchange(
            self.client
                .get(self.url("/api/tickets/analyzed"))
                .query(&params),
        )
        .await
    }

    async fn submit_run(&self, ticket_ids: Option<Vec<TicketId>>) -> Result<RunReceipt, ApiError> {
        let body = AnalyzeRequest { ticket_ids };
        debug!(
            explicit = body.ticket_ids.as_ref().map(Vec::len),
            "Submitting analysis run"
        );
        Self::exchange(self.client.post(self.url("/api/analyze")).json(&body)).await
    }

    async fn run_status(&self, run_id: RunId) -> Result<ActiveRun, ApiError> {
        Self::exchange(
            self.client
                .get(self.url(&format!("/api/analyze/{run_id}/status"))),
        )
        .await
    }

    async fn active_runs(&self) -> Result<Vec<ActiveRun>, ApiError> {
        Self::exchange(self.client.get(self.url("/api/analyze/active"))).await
    }

    async fn list_runs(&self, page: u32, page_size: u32) -> Result<RunPage, ApiError> {
        let params = [("page", page), ("page_size", page_size)];
        Self::exchange(self.client.get(self.url("/api/analyze/runs")).query(&params)).await
    }

    async fn run_detail(&self, run_id: RunId) -> Result<AnalysisRun, ApiError> {
        Self::exchange(self.client.get(self.url(&format!("/api/analyze/{run_id}")))).await
    }
}
