// ABOUTME: In-process stand-in for the tagging backend, served by axum on an
// ABOUTME: ephemeral port. Records auth headers and keeps targets in memory.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const VALID_TOKEN: &str = "tok-1";

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Default)]
pub struct Backend {
    pub hits: AtomicUsize,
    pub auth_headers: Mutex<Vec<String>>,
    pub targets: Mutex<Vec<Value>>,
    pub feedback: Mutex<Vec<Value>>,
    pub last_form: Mutex<HashMap<String, String>>,
}

impl Backend {
    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let value = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.auth_headers.lock().push(value.clone());
        if value == format!("Bearer {VALID_TOKEN}") {
            Ok(())
        } else {
            Err(failure(StatusCode::UNAUTHORIZED, "Invalid token"))
        }
    }
}

fn failure(status: StatusCode, detail: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": detail })))
}

/// Serve a fresh backend; returns its base URL and shared state.
pub async fn spawn() -> (String, Arc<Backend>) {
    let backend = Arc::new(Backend::default());

    let app = Router::new()
        .route("/me-jwt", get(me))
        .route("/tag", post(tag))
        .route("/upload-to-sharepoint", post(upload))
        .route("/feedback", post(submit_feedback))
        .route("/admin/feedback", get(list_feedback))
        .route(
            "/admin/upload-targets",
            get(list_targets).post(add_target).delete(delete_target),
        )
        .route("/admin/upload-targets/enabled", patch(set_enabled))
        .route("/admin/upload-targets/status", get(status))
        .route("/graph/resolve-site", get(resolve_site))
        .route("/graph/drives", get(drives))
        .route("/graph/folders", get(folders))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{addr}"), backend)
}

async fn me(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Reply {
    backend.authorize(&headers)?;
    Ok(Json(json!({
        "name": "Alice Admin",
        "email": "alice@contoso.com",
        "tid": "tenant-1",
        "isAdmin": true,
        "groups": ["g-admins"],
    })))
}

async fn read_form(mut multipart: Multipart) -> HashMap<String, String> {
    let mut form = HashMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name() {
            form.insert(format!("{name}.filename"), file_name.to_string());
        }
        let text = field.text().await.unwrap_or_default();
        form.insert(name, text);
    }
    form
}

async fn tag(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Reply {
    backend.authorize(&headers)?;
    let form = read_form(multipart).await;
    *backend.last_form.lock() = form.clone();

    let count: usize = form
        .get("num_tags")
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);
    let tags: Vec<String> = (1..=count).map(|i| format!("tag-{i}")).collect();
    Ok(Json(json!({ "tags": tags, "text": form.get("file") })))
}

async fn upload(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Reply {
    backend.authorize(&headers)?;
    let form = read_form(multipart).await;
    *backend.last_form.lock() = form.clone();

    let label = form.get("upload_target_label").cloned().unwrap_or_default();
    let known = backend
        .targets
        .lock()
        .iter()
        .any(|t| t["label"] == label.as_str());
    if !known {
        return Err(failure(StatusCode::NOT_FOUND, "Upload target not found."));
    }
    let filename = form.get("file.filename").cloned().unwrap_or_default();
    Ok(Json(json!({
        "item": { "id": "item-1", "name": filename, "webUrl": format!("https://contoso.sharepoint.com/{label}/{filename}") }
    })))
}

async fn submit_feedback(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    backend.authorize(&headers)?;
    let row = json!({
        "timestamp": "2026-10-18T09:00:00",
        "user": "alice@contoso.com",
        "filename": body["filename"],
        "rating": body["rating"].to_string(),
        "comment": body["comment"],
    });
    backend.feedback.lock().push(row);
    Ok(Json(json!({ "status": "ok" })))
}

async fn list_feedback(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Reply {
    backend.authorize(&headers)?;
    Ok(Json(Value::Array(backend.feedback.lock().clone())))
}

async fn list_targets(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Reply {
    backend.authorize(&headers)?;
    Ok(Json(Value::Array(backend.targets.lock().clone())))
}

async fn add_target(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(target): Json<Value>,
) -> Reply {
    backend.authorize(&headers)?;
    let mut targets = backend.targets.lock();
    if targets.iter().any(|t| t["label"] == target["label"]) {
        return Err(failure(
            StatusCode::CONFLICT,
            "Target with this label already exists.",
        ));
    }
    targets.push(target);
    Ok(Json(json!({ "message": "Upload target added." })))
}

async fn delete_target(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    backend.authorize(&headers)?;
    let label = query.get("label").cloned().unwrap_or_default();
    let mut targets = backend.targets.lock();
    let before = targets.len();
    targets.retain(|t| t["label"] != label.as_str());
    if targets.len() == before {
        return Err(failure(StatusCode::NOT_FOUND, "Target not found."));
    }
    Ok(Json(json!({ "message": "Upload target deleted." })))
}

async fn set_enabled(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    backend.authorize(&headers)?;
    let label = query.get("label").cloned().unwrap_or_default();
    let enabled = query.get("enabled").map(String::as_str) == Some("true");
    let mut targets = backend.targets.lock();
    let Some(target) = targets.iter_mut().find(|t| t["label"] == label.as_str()) else {
        return Err(failure(StatusCode::NOT_FOUND, "Target not found."));
    };
    target["enabled"] = Value::Bool(enabled);
    Ok(Json(json!({
        "message": format!("Target '{label}' set to enabled={}", if enabled { "True" } else { "False" })
    })))
}

async fn status(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Reply {
    backend.authorize(&headers)?;
    Ok(Json(json!({
        "HR Docs": {
            "last_run": "2026-10-18T08:00:00Z",
            "last_success": "2026-10-18T08:00:00Z",
            "files_processed": 12
        },
        "Legal": { "last_error": "403 Forbidden" },
    })))
}

async fn resolve_site(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    backend.authorize(&headers)?;
    let url = query.get("url").cloned().unwrap_or_default();
    let id = match url.rsplit('/').next().unwrap_or_default() {
        "HR" => "site-hr",
        "Empty" => "site-empty",
        "Broken" => "site-broken",
        _ => return Err(failure(StatusCode::NOT_FOUND, "Site not found")),
    };
    Ok(Json(json!({ "id": id, "name": "Site", "webUrl": url })))
}

async fn drives(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    backend.authorize(&headers)?;
    let drives = match query.get("siteId").map(String::as_str) {
        Some("site-hr") => json!([
            { "id": "drive-docs", "name": "Documents" },
            { "id": "drive-archive", "name": "Archive" },
        ]),
        Some("site-broken") => json!([{ "id": "drive-broken", "name": "Broken" }]),
        _ => json!([]),
    };
    Ok(Json(drives))
}

async fn folders(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    backend.authorize(&headers)?;
    match query.get("driveId").map(String::as_str) {
        Some("drive-docs") => Ok(Json(json!([
            { "name": "/", "path": "" },
            { "name": "Policies", "path": "Policies" },
            { "name": "Policies/2026", "path": "Policies/2026" },
        ]))),
        Some("drive-archive") => Ok(Json(json!([
            { "name": "Old", "path": "Old" },
        ]))),
        _ => Err(failure(StatusCode::BAD_GATEWAY, "Graph listing failed")),
    }
}
