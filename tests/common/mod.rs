//! In-process stand-in for the asKNOU backend.
//!
//! Serves the same routes and JSON shapes as the FastAPI server, keeps its
//! documents in memory, and records every request so tests can assert on
//! what the client actually sent.

#![allow(dead_code)]

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub len: usize,
}

#[derive(Default)]
pub struct MockState {
    pub documents: Vec<Value>,
    pub requests: Vec<Recorded>,
    pub uploads: Vec<ReceivedUpload>,
    pub ask_failure: Option<(u16, String)>,
}

pub type Shared = Arc<Mutex<MockState>>;

pub fn document(doc_id: &str, filename: &str, processed: bool) -> Value {
    json!({
        "doc_id": doc_id,
        "filename": filename,
        "file_size_mb": 1.25,
        "created_at": "2024-03-01T09:00:00",
        "status": {
            "pdf_exists": true,
            "vector_exists": processed,
            "metadata_exists": processed,
            "processed": processed
        }
    })
}

pub fn seed_documents() -> Vec<Value> {
    vec![
        document("a1", "2024 학사일정.pdf", true),
        document("b2", "수강편람.pdf", true),
        document("c3", "졸업요건.pdf", false),
    ]
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl MockBackend {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn document_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .documents
            .iter()
            .map(|d| d["doc_id"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn fail_ask(&self, status: u16, detail: &str) {
        self.state.lock().unwrap().ask_failure = Some((status, detail.to_string()));
    }

    /// Start on the current tokio runtime.
    pub async fn start(documents: Vec<Value>) -> MockBackend {
        let state: Shared = Arc::new(Mutex::new(MockState {
            documents,
            ..Default::default()
        }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        MockBackend { addr, state }
    }

    /// Start on a dedicated thread with its own runtime, for synchronous
    /// tests that drive the compiled binary.
    pub fn start_in_thread(documents: Vec<Value>) -> MockBackend {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async move {
                let backend = MockBackend::start(documents).await;
                tx.send((backend.addr, backend.state.clone())).unwrap();
                std::future::pending::<()>().await;
            });
        });
        let (addr, state) = rx.recv().unwrap();
        MockBackend { addr, state }
    }
}

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "문서를 찾을 수 없습니다." })),
    )
}

fn record(state: &Shared, method: &'static str, path: String, body: Value) {
    record_with_query(state, method, path, HashMap::new(), body);
}

fn record_with_query(
    state: &Shared,
    method: &'static str,
    path: String,
    query: HashMap<String, String>,
    body: Value,
) {
    state.lock().unwrap().requests.push(Recorded {
        method,
        path,
        query,
        body,
    });
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/", get(info))
        .route("/health", get(health))
        .route("/ask/", post(ask))
        .route("/ask/search", post(search))
        .route("/ask/test", get(qa_test))
        .route("/upload/pdf", post(upload))
        .route("/upload/status/{doc_id}", get(upload_status))
        .route("/admin/documents", get(list_documents))
        .route(
            "/admin/documents/{doc_id}",
            get(document_details).delete(delete_document),
        )
        .route("/admin/documents/{doc_id}/filename", put(rename))
        .route("/admin/cleanup/preview", get(cleanup_preview))
        .route("/admin/cleanup", post(cleanup))
        .route("/admin/delete-selected", post(delete_selected))
        .route("/admin/statistics", get(statistics))
        .with_state(state)
}

async fn info(State(state): State<Shared>) -> Json<Value> {
    record(&state, "GET", "/".into(), Value::Null);
    Json(json!({
        "message": "asKNOU Backend API",
        "description": "KNOU academic information RAG chatbot",
        "version": "1.0.0",
        "endpoints": { "upload": "/upload", "ask": "/ask", "admin": "/admin" }
    }))
}

async fn health(State(state): State<Shared>) -> Json<Value> {
    record(&state, "GET", "/health".into(), Value::Null);
    Json(json!({ "status": "healthy", "timestamp": "2024-03-01T09:00:00" }))
}

async fn ask(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    record(&state, "POST", "/ask/".into(), body.clone());
    if let Some((status, detail)) = state.lock().unwrap().ask_failure.clone() {
        let status = StatusCode::from_u16(status).unwrap();
        return Err((status, Json(json!({ "detail": detail }))));
    }
    Ok(Json(json!({
        "answer": "수강신청은 매 학기 시작 전 2주간 진행됩니다.",
        "sources": [
            { "filename": "2024 학사일정.pdf", "page": 3, "chunk_id": 12, "score": 0.91,
              "content_preview": "수강신청 기간" },
            { "filename": "수강편람.pdf", "page": "Unknown", "chunk_id": "Unknown", "score": 0.5,
              "content_preview": "" }
        ],
        "retrieved_chunks": 2,
        "question": body["question"]
    })))
}

async fn search(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    record(&state, "POST", "/ask/search".into(), body.clone());
    Json(json!({
        "query": body["question"],
        "total_results": 1,
        "results": [
            { "doc_id": "a1", "filename": "2024 학사일정.pdf", "page": 3, "chunk_id": 12,
              "score": 0.91, "content_preview": "수강신청 기간", "rank": 1 }
        ]
    }))
}

async fn qa_test(State(state): State<Shared>) -> Json<Value> {
    record(&state, "GET", "/ask/test".into(), Value::Null);
    Json(json!({
        "status": "success",
        "message": "All systems operational",
        "gemini_api": { "status": "success" },
        "embedding_model": { "loaded": true }
    }))
}

async fn upload(State(state): State<Shared>, mut multipart: Multipart) -> Reply {
    let mut received = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default();
        received = Some(ReceivedUpload {
            field: name,
            file_name,
            content_type,
            len: bytes.len(),
        });
    }
    record(&state, "POST", "/upload/pdf".into(), Value::Null);

    let Some(upload) = received else {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["body", "file"], "msg": "field required" }] })),
        ));
    };
    if !upload.file_name.to_lowercase().ends_with(".pdf") {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "PDF 파일만 업로드 가능합니다." })),
        ));
    }

    let mut guard = state.lock().unwrap();
    let doc_id = format!("u{}", guard.uploads.len() + 1);
    guard
        .documents
        .push(document(&doc_id, &upload.file_name, true));
    guard.uploads.push(upload.clone());
    Ok(Json(json!({
        "success": true,
        "message": "PDF 업로드 및 처리 완료",
        "doc_id": doc_id,
        "filename": upload.file_name,
        "file_size": upload.len,
        "total_chunks": 7,
        "total_pages": 2,
        "embedding_dimension": 768
    })))
}

fn find(state: &Shared, doc_id: &str) -> Option<Value> {
    state
        .lock()
        .unwrap()
        .documents
        .iter()
        .find(|d| d["doc_id"] == doc_id)
        .cloned()
}

async fn upload_status(State(state): State<Shared>, Path(doc_id): Path<String>) -> Reply {
    record(&state, "GET", format!("/upload/status/{}", doc_id), Value::Null);
    let doc = find(&state, &doc_id).ok_or_else(not_found)?;
    Ok(Json(json!({
        "doc_id": doc_id,
        "pdf_exists": doc["status"]["pdf_exists"],
        "vector_exists": doc["status"]["vector_exists"],
        "metadata_exists": doc["status"]["metadata_exists"],
        "file_size": 1310720,
        "created_at": 1709283600.5
    })))
}

fn list_body(documents: &[Value]) -> Value {
    let processed = documents
        .iter()
        .filter(|d| d["status"]["processed"] == true)
        .count();
    json!({
        "documents": documents,
        "statistics": {
            "total_documents": documents.len(),
            "processed_documents": processed,
            "total_size_mb": 1.25 * documents.len() as f64,
            "pending_processing": documents.len() - processed
        }
    })
}

async fn list_documents(State(state): State<Shared>) -> Json<Value> {
    record(&state, "GET", "/admin/documents".into(), Value::Null);
    let docs = state.lock().unwrap().documents.clone();
    Json(list_body(&docs))
}

async fn document_details(State(state): State<Shared>, Path(doc_id): Path<String>) -> Reply {
    record(&state, "GET", format!("/admin/documents/{}", doc_id), Value::Null);
    let doc = find(&state, &doc_id).ok_or_else(not_found)?;
    Ok(Json(json!({
        "document": {
            "doc_id": doc_id,
            "filename": doc["filename"],
            "file_size_mb": doc["file_size_mb"],
            "created_at": doc["created_at"],
            "modified_at": doc["created_at"]
        },
        "vector_store": { "chunks": 4 }
    })))
}

async fn delete_document(State(state): State<Shared>, Path(doc_id): Path<String>) -> Reply {
    record(&state, "DELETE", format!("/admin/documents/{}", doc_id), Value::Null);
    let mut guard = state.lock().unwrap();
    let pos = guard
        .documents
        .iter()
        .position(|d| d["doc_id"] == doc_id.as_str())
        .ok_or_else(not_found)?;
    let removed = guard.documents.remove(pos);
    Ok(Json(json!({
        "success": true,
        "message": format!("문서 '{}'가 삭제되었습니다.", removed["filename"].as_str().unwrap_or("")),
        "doc_id": doc_id,
        "deleted_file_size_mb": removed["file_size_mb"]
    })))
}

async fn rename(
    State(state): State<Shared>,
    Path(doc_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    record_with_query(
        &state,
        "PUT",
        format!("/admin/documents/{}/filename", doc_id),
        query.clone(),
        Value::Null,
    );
    let Some(new_name) = query.get("new_filename").map(|s| s.trim().to_string()) else {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "new_filename is required" })),
        ));
    };
    let new_name = if new_name.to_lowercase().ends_with(".pdf") {
        new_name
    } else {
        format!("{}.pdf", new_name)
    };

    let mut guard = state.lock().unwrap();
    let doc = guard
        .documents
        .iter_mut()
        .find(|d| d["doc_id"] == doc_id.as_str())
        .ok_or_else(not_found)?;
    let old = doc["filename"].clone();
    doc["filename"] = Value::String(new_name.clone());
    Ok(Json(json!({
        "success": true,
        "message": format!("파일명이 '{}'로 변경되었습니다.", new_name),
        "doc_id": doc_id,
        "old_filename": old,
        "new_filename": new_name
    })))
}

fn incomplete(documents: &[Value]) -> Vec<Value> {
    documents
        .iter()
        .filter(|d| d["status"]["processed"] != true)
        .cloned()
        .collect()
}

async fn cleanup_preview(State(state): State<Shared>) -> Json<Value> {
    record(&state, "GET", "/admin/cleanup/preview".into(), Value::Null);
    let targets: Vec<Value> = incomplete(&state.lock().unwrap().documents)
        .into_iter()
        .map(|d| {
            json!({
                "doc_id": d["doc_id"],
                "filename": d["filename"],
                "file_size_mb": d["file_size_mb"],
                "reason": "incomplete_processing",
                "issues": {
                    "no_vector": d["status"]["vector_exists"] != true,
                    "no_metadata": d["status"]["metadata_exists"] != true
                }
            })
        })
        .collect();
    Json(json!({
        "success": true,
        "total_count": targets.len(),
        "total_size_mb": 1.25 * targets.len() as f64,
        "cleanup_targets": targets
    }))
}

async fn cleanup(State(state): State<Shared>) -> Json<Value> {
    record(&state, "POST", "/admin/cleanup".into(), Value::Null);
    let mut guard = state.lock().unwrap();
    let cleaned = incomplete(&guard.documents);
    guard.documents.retain(|d| d["status"]["processed"] == true);
    Json(json!({
        "success": true,
        "message": format!("{}개의 불완전한 파일이 정리되었습니다.", cleaned.len()),
        "cleaned_files": cleaned.iter().map(|d| json!({
            "doc_id": d["doc_id"],
            "filename": d["filename"],
            "reason": "incomplete_processing"
        })).collect::<Vec<_>>()
    }))
}

async fn delete_selected(State(state): State<Shared>, Json(ids): Json<Vec<String>>) -> Json<Value> {
    record(&state, "POST", "/admin/delete-selected".into(), json!(ids));
    let mut guard = state.lock().unwrap();
    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    for id in &ids {
        match guard.documents.iter().position(|d| d["doc_id"] == id.as_str()) {
            Some(pos) => {
                let d = guard.documents.remove(pos);
                deleted.push(json!({
                    "doc_id": id,
                    "filename": d["filename"],
                    "file_size_mb": d["file_size_mb"]
                }));
            }
            None => failed.push(json!({ "doc_id": id, "reason": "문서를 찾을 수 없습니다." })),
        }
    }
    Json(json!({
        "success": true,
        "message": format!("{}개 문서가 삭제되었습니다.", deleted.len()),
        "total_deleted_size_mb": 1.25 * deleted.len() as f64,
        "deleted_files": deleted,
        "failed_files": failed
    }))
}

async fn statistics(State(state): State<Shared>) -> Json<Value> {
    record(&state, "GET", "/admin/statistics".into(), Value::Null);
    let count = state.lock().unwrap().documents.len();
    Json(json!({
        "document_statistics": {
            "total_documents": count,
            "processed_documents": count,
            "pending_documents": 0,
            "total_size_mb": 1.25 * count as f64
        },
        "vector_statistics": {
            "total_vectors": count * 4,
            "total_chunks": count * 4,
            "embedding_dimensions": [768],
            "average_chunks_per_doc": 4.0
        },
        "system_status": {
            "embedding_model": { "loaded": true, "model_name": "jhgan/ko-sbert-sts" },
            "gemini_api": "success",
            "gemini_message": "ok"
        }
    }))
}
