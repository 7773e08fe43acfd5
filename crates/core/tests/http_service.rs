//! HTTP client round-trip tests against a loopback fixture service.

use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use triago_core::{
    ApiError, HttpTicketService, NewTicket, RunStatus, ServiceConfig, TicketQuery, TicketService,
    TicketStatus,
};

async fn list_tickets(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    // Echo the status filter back in the titles so the test can see it.
    let status = params.get("status").cloned().unwrap_or_default();
    Json(json!({
        "items": [
            {
                "id": 1,
                "title": format!("first {status}"),
                "description": "d1",
                "created_at": "2026-08-01T12:00:00Z",
                "status": "ready"
            },
            {
                "id": 2,
                "title": "second",
                "description": "d2",
                "created_at": "2026-08-01T12:05:00Z",
                "status": "ready"
            }
        ],
        "page": params.get("page").and_then(|p| p.parse::<u32>().ok()).unwrap_or(1),
        "page_size": 10
    }))
}

async fn create_tickets(Json(body): Json<Vec<NewTicket>>) -> Json<Value> {
    let items: Vec<Value> = body
        .iter()
        .enumerate()
        .map(|(i, t)| {
            json!({
                "id": i as i64 + 100,
                "title": t.title,
                "description": t.description,
                "created_at": "2026-08-01T12:00:00Z",
                "status": "ready"
            })
        })
        .collect();
    Json(Value::Array(items))
}

async fn list_analyzed() -> Json<Value> {
    Json(json!({
        "items": [
            {
                "id": 5,
                "analysis_id": 51,
                "title": "analyzed one",
                "description": "d",
                "category": "billing",
                "priority": "high",
                "notes": "double charge"
            }
        ],
        "page": 1,
        "page_size": 10
    }))
}

async fn submit(Json(body): Json<Value>) -> Json<Value> {
    // Explicit submissions carry "ticketIds"; analyze-all omits it.
    let explicit = body.get("ticketIds").is_some();
    Json(json!({
        "run_id": if explicit { 11 } else { 12 },
        "status": "pending"
    }))
}

async fn run_status(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({
        "run_id": id,
        "status": "processing",
        "ticket_ids": [5, 7]
    }))
}

async fn active_runs() -> Json<Value> {
    Json(json!([
        { "run_id": 11, "status": "pending", "ticket_ids": [5] },
        { "run_id": 12, "status": "processing", "ticket_ids": [7, 9] }
    ]))
}

async fn list_runs() -> Json<Value> {
    Json(json!({
        "items": [
            { "id": 12, "created_at": "2026-08-01T13:00:00Z", "ticket_count": 2, "summary": null },
            { "id": 11, "created_at": "2026-08-01T12:30:00Z", "ticket_count": 1, "summary": "done" }
        ],
        "page": 1,
        "page_size": 10
    }))
}

async fn run_detail(Path(id): Path<i64>) -> impl IntoResponse {
    if id != 11 {
        return (StatusCode::NOT_FOUND, "Analysis run not found").into_response();
    }
    Json(json!({
        "id": 11,
        "created_at": "2026-08-01T12:30:00Z",
        "status": "completed",
        "summary": "done",
        "ticket_analyses": [
            {
                "id": 51,
                "ticket_id": 5,
                "category": "billing",
                "priority": "medium",
                "notes": null
            }
        ]
    }))
    .into_response()
}

/// Start the fixture service on an ephemeral port, return its base URL.
async fn spawn_fixture() -> String {
    let app = Router::new()
        .route("/api/tickets", get(list_tickets).post(create_tickets))
        .route("/api/tickets/analyzed", get(list_analyzed))
        .route("/api/analyze", post(submit))
        .route("/api/analyze/active", get(active_runs))
        .route("/api/analyze/runs", get(list_runs))
        .route("/api/analyze/{id}", get(run_detail))
        .route("/api/analyze/{id}/status", get(run_status));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: String) -> HttpTicketService {
    HttpTicketService::new(&ServiceConfig {
        base_url,
        timeout_secs: 5,
    })
}

#[tokio::test]
async fn test_list_tickets_round_trip() {
    let service = client(spawn_fixture().await);
    let query = TicketQuery::page(2, 10).with_status(TicketStatus::Ready);
    let page = service.list_tickets(&query).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.page, 2);
    // The status filter reached the server as a query parameter.
    assert_eq!(page.items[0].title, "first ready");
    assert_eq!(page.items[0].status, TicketStatus::Ready);
}

#[tokio::test]
async fn test_create_tickets_round_trip() {
    let service = client(spawn_fixture().await);
    let created = service
        .create_tickets(vec![
            NewTicket::new("a", "one"),
            NewTicket::new("b", "two"),
        ])
        .await
        .unwrap();

    assert_eq!(created.len(), 2);
    assert_eq!(created[0].id, 100);
    assert_eq!(created[1].title, "b");
}

#[tokio::test]
async fn test_list_analyzed_round_trip() {
    let service = client(spawn_fixture().await);
    let page = service.list_analyzed(1, 10).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].category, "billing");
    assert_eq!(page.items[0].notes.as_deref(), Some("double charge"));
}

#[tokio::test]
async fn test_submit_run_round_trip() {
    let service = client(spawn_fixture().await);

    let explicit = service.submit_run(Some(vec![5, 7])).await.unwrap();
    assert_eq!(explicit.run_id, 11);
    assert_eq!(explicit.status, RunStatus::Pending);

    let all = service.submit_run(None).await.unwrap();
    assert_eq!(all.run_id, 12);
}

#[tokio::test]
async fn test_run_status_round_trip() {
    let service = client(spawn_fixture().await);
    let status = service.run_status(42).await.unwrap();
    assert_eq!(status.run_id, 42);
    assert_eq!(status.status, RunStatus::Processing);
    assert_eq!(status.ticket_ids, vec![5, 7]);
}

#[tokio::test]
async fn test_active_runs_round_trip() {
    let service = client(spawn_fixture().await);
    let active = service.active_runs().await.unwrap();
    assert_eq!(active.len(), 2);
    assert_eq!(active[1].ticket_ids, vec![7, 9]);
}

#[tokio::test]
async fn test_list_runs_round_trip() {
    let service = client(spawn_fixture().await);
    let page = service.list_runs(1, 10).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].id, 12);
    assert_eq!(page.items[1].summary.as_deref(), Some("done"));
}

#[tokio::test]
async fn test_run_detail_round_trip() {
    let service = client(spawn_fixture().await);
    let run = service.run_detail(11).await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.ticket_analyses.len(), 1);
    assert_eq!(run.ticket_analyses[0].ticket_id, 5);
}

#[tokio::test]
async fn test_not_found_maps_to_http_error() {
    let service = client(spawn_fixture().await);
    let err = service.run_detail(999).await.unwrap_err();
    match err {
        ApiError::Http { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("not found"));
        }
        other => panic!("Expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_service_maps_to_connection_error() {
    // Port 1 is never serving; the connect must fail, not hang.
    let service = client("http://127.0.0.1:1".to_string());
    let err = service.active_runs().await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::ConnectionFailed(_) | ApiError::Timeout | ApiError::Other(_)
    ));
}
