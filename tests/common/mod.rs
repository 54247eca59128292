//! In-process stand-in for the helpdesk backend, served on an ephemeral port.
#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct Backend {
    pub tickets: Vec<Value>,
    pub solutions: Vec<(u64, Value)>,
    pub searches: Vec<Value>,
    next_id: u64,
}

pub type Shared = Arc<Mutex<Backend>>;

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn knowledge_base() -> Vec<Value> {
    vec![
        json!({
            "id": "kb-1",
            "title": "Clear the paper path",
            "content": "Open tray 2 and remove the jammed sheet.",
            "score": 9.2,
            "source": "opensearch",
            "url": "https://kb.local/paper-path",
            "highlight": { "content": ["remove the <em>jammed</em> sheet", "tray 2"] }
        }),
        json!({
            "id": "wiki-7",
            "title": "Printer FAQ",
            "content": "Most jams come from damp paper.",
            "score": 8.1,
            "source": "mediawiki",
            "tags": ["printer", "hardware"]
        }),
        json!({
            "title": "Replace the roller",
            "content": "Worn pickup rollers cause repeated jams.",
            "score": 7.8,
            "source": "mock",
            "highlight": "Worn pickup <em>rollers</em> cause\nrepeated jams."
        }),
    ]
}

async fn search(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.lock().unwrap().searches.push(body.clone());

    match body["query"].as_str().unwrap_or_default() {
        "boom" => return error(StatusCode::INTERNAL_SERVER_ERROR, "OpenSearch unreachable"),
        "nothing" => return Json(json!({ "results": [] })).into_response(),
        _ => {}
    }

    let sources: Vec<String> = body["sources"]
        .as_array()
        .map(|a| a.iter().filter_map(|s| s.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let results: Vec<Value> = knowledge_base()
        .into_iter()
        .filter(|r| sources.is_empty() || sources.iter().any(|s| r["source"] == *s))
        .collect();
    Json(json!({ "results": results })).into_response()
}

async fn create_ticket(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let subject = body["subject"].as_str().unwrap_or_default();
    if subject.is_empty() {
        return error(StatusCode::BAD_REQUEST, "subject required");
    }

    let mut backend = state.lock().unwrap();
    backend.next_id += 1;
    let id = backend.next_id;
    backend.tickets.push(json!({
        "id": id,
        "subject": subject,
        "description": body["description"],
        "priority": body["priority"],
        "status": "new",
        "created_on": format!("2025-03-{:02}T09:00:00", 10 + id),
        "project_id": body["project_id"],
        "comments": []
    }));
    (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
}

async fn list_tickets(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(state.lock().unwrap().tickets.clone()))
}

async fn get_ticket(State(state): State<Shared>, Path(id): Path<u64>) -> Response {
    let backend = state.lock().unwrap();
    match backend.tickets.iter().find(|t| t["id"] == id) {
        Some(t) => Json(t.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Ticket not found"),
    }
}

async fn attach_solution(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    if !backend.tickets.iter().any(|t| t["id"] == id) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to attach solution");
    }
    backend.solutions.push((id, body));
    Json(json!({ "success": true })).into_response()
}

async fn add_comment(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    let Some(ticket) = backend.tickets.iter_mut().find(|t| t["id"] == id) else {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to add comment");
    };
    if let Some(comments) = ticket["comments"].as_array_mut() {
        comments.push(json!({
            "text": body["comment"],
            "created_on": "2025-03-30T08:15:00"
        }));
    }
    Json(json!({ "success": true })).into_response()
}

pub fn backend_router(state: Shared) -> Router {
    Router::new()
        .route("/api/search", post(search))
        .route("/api/tickets", get(list_tickets).post(create_ticket))
        .route("/api/tickets/{id}", get(get_ticket))
        .route("/api/tickets/{id}/solution", post(attach_solution))
        .route("/api/tickets/{id}/comment", post(add_comment))
        .with_state(state)
}

/// Serves `router` on `127.0.0.1:0` and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn spawn_backend() -> (String, Shared) {
    let state = Shared::default();
    let url = serve(backend_router(state.clone())).await;
    (url, state)
}

/// Runs a backend on its own runtime thread, for tests that drive the binary.
pub fn spawn_backend_thread() -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (url, _state) = spawn_backend().await;
            tx.send(url).unwrap();
            std::future::pending::<()>().await;
        });
    });
    rx.recv().unwrap()
}
