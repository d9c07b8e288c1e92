//! In-process stand-in for the documentation-generation backend.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

pub const USERNAME: &str = "alice@example.com";
pub const PASSWORD: &str = "secret";
pub const TASK_ID: &str = "task-42";
/// Submitting this URL makes `/process` fail.
pub const BROKEN_REPO: &str = "https://github.com/example/broken";
/// Submitting this URL makes the task fail on the backend.
pub const FAILING_REPO: &str = "https://github.com/example/failing";

#[derive(Default)]
pub struct Stub {
    pub key_saved: AtomicBool,
    pub status_calls: AtomicUsize,
    pub result_calls: AtomicUsize,
    pub last_api_key: Mutex<Option<String>>,
    pub last_repo: Mutex<Option<String>>,
    /// Number of IN_PROGRESS answers before the terminal one.
    pub pending_polls: usize,
}

pub async fn spawn_stub(pending_polls: usize) -> (String, Arc<Stub>) {
    let stub = Arc::new(Stub {
        pending_polls,
        ..Stub::default()
    });
    let app = Router::new()
        .route("/auth/token", post(login))
        .route("/auth/register", post(register))
        .route("/api/v1/settings/gemini-api-key", post(save_key))
        .route("/api/v1/settings/gemini-api-key-status", get(key_status))
        .route("/process", post(process))
        .route("/status/:id", get(status))
        .route("/result/:id", get(result))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), stub)
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |c| c.contains("session=abc"))
}

fn unauthenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Not authenticated"})),
    )
        .into_response()
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(Form(form): Form<LoginForm>) -> Response {
    if form.username == USERNAME && form.password == PASSWORD {
        (
            [(header::SET_COOKIE, "session=abc; Path=/; HttpOnly")],
            Json(json!({"user_name": "Alice"})),
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        )
            .into_response()
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@example.com" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": [{"loc": ["body", "email"], "msg": "Email already registered"}]})),
        )
            .into_response();
    }
    if body["username"] != body["email"] {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }
    StatusCode::CREATED.into_response()
}

async fn save_key(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !has_session(&headers) {
        return unauthenticated();
    }
    if body["api_key"].as_str().map_or(true, str::is_empty) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [{"loc": ["body", "api_key"], "type": "missing"}]})),
        )
            .into_response();
    }
    stub.key_saved.store(true, Ordering::SeqCst);
    Json(json!({"message": "saved"})).into_response()
}

async fn key_status(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return unauthenticated();
    }
    Json(json!({"configured": stub.key_saved.load(Ordering::SeqCst)})).into_response()
}

async fn process(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !has_session(&headers) {
        return unauthenticated();
    }
    *stub.last_api_key.lock().unwrap() = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let url = body["url"].as_str().unwrap_or_default().to_string();
    *stub.last_repo.lock().unwrap() = Some(url.clone());
    if url == BROKEN_REPO {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    Json(json!({"task_id": TASK_ID, "status": "PENDING"})).into_response()
}

async fn status(State(stub): State<Arc<Stub>>, Path(id): Path<String>) -> Response {
    if id != TASK_ID {
        return StatusCode::NOT_FOUND.into_response();
    }
    let n = stub.status_calls.fetch_add(1, Ordering::SeqCst);
    if n < stub.pending_polls {
        return Json(json!({"status": "IN_PROGRESS", "message": "Cloning repository"}))
            .into_response();
    }
    let failing = stub.last_repo.lock().unwrap().as_deref() == Some(FAILING_REPO);
    if failing {
        Json(json!({"status": "FAILED", "errors": [{"file_path": null, "error": "Repository not found"}]}))
            .into_response()
    } else {
        Json(json!({"status": "SUCCESS"})).into_response()
    }
}

async fn result(State(stub): State<Arc<Stub>>, Path(id): Path<String>) -> Response {
    if id != TASK_ID {
        return StatusCode::NOT_FOUND.into_response();
    }
    stub.result_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "total_sections": 3,
        "processed": 2,
        "skipped": 0,
        "failed": 1,
        "results": [
            {"section_name": "Project Overview", "output_path": "docs/overview.md",
             "status": "success", "markdown_content": "# Overview\n"},
            {"section_name": "Architecture", "output_path": "docs/architecture.md",
             "status": "success", "markdown_content": "# Architecture\n"},
            {"section_name": "Getting Started", "output_path": "docs/getting_started.md",
             "status": "failed", "error": "model timeout"}
        ],
        "source_analysis": {
            "file_tree": {"name": "project", "path": "/", "children": [
                {"name": "src", "path": "/src", "type": "dir", "children": [
                    {"name": "main.rs", "path": "src/main.rs", "type": "file", "is_binary": false}
                ]},
                {"name": "Cargo.toml", "path": "Cargo.toml", "type": "file", "is_binary": false}
            ]},
            "file_analysis": {
                "src/main.rs": {"content": "fn main() {}", "language": "rust", "is_binary": false}
            }
        }
    }))
    .into_response()
}
