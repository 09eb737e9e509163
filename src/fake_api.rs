//! In-memory [`RagApi`] used by unit tests.
//!
//! Keeps a mutable document list so that mutating calls are visible to the
//! next `list_documents`, records every call by operation name, and can be
//! told to fail any operation with a given status and detail.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::ApiError;
use crate::models::*;
use crate::traits::{ApiResult, RagApi};

pub(crate) struct FakeApi {
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, (u16, Option<String>)>>,
    documents: Mutex<Vec<DocumentSummary>>,
    answer: Mutex<QuestionResponse>,
    delay: Mutex<Duration>,
}

pub(crate) fn doc(id: &str, filename: &str, processed: bool) -> DocumentSummary {
    DocumentSummary {
        doc_id: id.to_string(),
        filename: filename.to_string(),
        file_size_mb: 1.5,
        created_at: "2024-03-01T09:00:00".to_string(),
        status: DocumentStatus {
            pdf_exists: true,
            vector_exists: processed,
            metadata_exists: processed,
            processed,
        },
    }
}

pub(crate) fn citation(filename: &str, page: i64, score: f64) -> SourceCitation {
    SourceCitation {
        filename: filename.to_string(),
        page: NumberOrText::Number(page),
        chunk_id: NumberOrText::Number(page * 10),
        score,
        content_preview: format!("{} p.{} preview", filename, page),
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            documents: Mutex::new(Vec::new()),
            answer: Mutex::new(QuestionResponse {
                answer: "fake answer".to_string(),
                sources: Vec::new(),
                retrieved_chunks: 0,
                question: String::new(),
                error: None,
            }),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    pub fn with_documents(docs: Vec<DocumentSummary>) -> Self {
        let api = Self::new();
        *api.documents.lock().unwrap() = docs;
        api
    }

    pub fn set_answer(&self, answer: &str, sources: Vec<SourceCitation>) {
        let mut current = self.answer.lock().unwrap();
        current.retrieved_chunks = sources.len() as u64;
        current.answer = answer.to_string();
        current.sources = sources;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn fail(&self, op: &'static str, status: u16, detail: Option<&str>) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, (status, detail.map(str::to_string)));
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    pub fn document_ids(&self) -> Vec<String> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.doc_id.clone())
            .collect()
    }

    async fn record(&self, op: &'static str) -> ApiResult<()> {
        self.calls.lock().unwrap().push(op);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failures.lock().unwrap().get(op).cloned();
        match failure {
            Some((status, detail)) => {
                let body = match detail {
                    Some(d) => serde_json::json!({ "detail": d }).to_string(),
                    None => String::new(),
                };
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Err(ApiError::from_status(status, body))
            }
            None => Ok(()),
        }
    }

    fn not_found() -> ApiError {
        ApiError::from_status(
            StatusCode::NOT_FOUND,
            r#"{"detail":"Document not found"}"#.to_string(),
        )
    }
}

#[async_trait]
impl RagApi for FakeApi {
    async fn upload_pdf(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<UploadResponse> {
        self.record("upload_pdf").await?;
        let doc_id = format!("doc-{}", self.documents.lock().unwrap().len() + 1);
        self.documents
            .lock()
            .unwrap()
            .push(doc(&doc_id, file_name, true));
        Ok(UploadResponse {
            success: true,
            message: "uploaded".to_string(),
            doc_id,
            filename: file_name.to_string(),
            file_size: bytes.len() as u64,
            total_chunks: 4,
            total_pages: 2,
            embedding_dimension: 768,
        })
    }

    async fn upload_status(&self, doc_id: &str) -> ApiResult<UploadStatus> {
        self.record("upload_status").await?;
        let docs = self.documents.lock().unwrap();
        let d = docs
            .iter()
            .find(|d| d.doc_id == doc_id)
            .ok_or_else(Self::not_found)?;
        Ok(UploadStatus {
            doc_id: d.doc_id.clone(),
            pdf_exists: d.status.pdf_exists,
            vector_exists: d.status.vector_exists,
            metadata_exists: d.status.metadata_exists,
            file_size: 0,
            created_at: None,
            vector_stats: serde_json::Value::Null,
        })
    }

    async fn ask(&self, request: &QuestionRequest) -> ApiResult<QuestionResponse> {
        self.record("ask").await?;
        let mut response = self.answer.lock().unwrap().clone();
        response.question = request.question.clone();
        Ok(response)
    }

    async fn search(&self, request: &QuestionRequest) -> ApiResult<SearchResponse> {
        self.record("search").await?;
        let sources = self.answer.lock().unwrap().sources.clone();
        let results: Vec<SearchHit> = sources
            .into_iter()
            .enumerate()
            .map(|(i, s)| SearchHit {
                doc_id: format!("doc-{}", i + 1),
                filename: s.filename,
                page: s.page,
                chunk_id: s.chunk_id,
                score: s.score,
                content_preview: s.content_preview,
                rank: i as u32 + 1,
            })
            .collect();
        Ok(SearchResponse {
            query: request.question.clone(),
            total_results: results.len() as u64,
            results,
        })
    }

    async fn test_qa(&self) -> ApiResult<QaTestReport> {
        self.record("test_qa").await?;
        Ok(QaTestReport {
            status: "success".to_string(),
            message: "ok".to_string(),
            gemini_api: serde_json::Value::Null,
            embedding_model: serde_json::Value::Null,
            document_status: serde_json::Value::Null,
        })
    }

    async fn list_documents(&self) -> ApiResult<DocumentListResponse> {
        self.record("list_documents").await?;
        let documents = self.documents.lock().unwrap().clone();
        let processed = documents.iter().filter(|d| d.status.processed).count() as u64;
        let total = documents.len() as u64;
        Ok(DocumentListResponse {
            statistics: DocumentListStatistics {
                total_documents: total,
                processed_documents: processed,
                total_size_mb: documents.iter().map(|d| d.file_size_mb).sum(),
                pending_processing: total - processed,
            },
            documents,
        })
    }

    async fn document_details(&self, doc_id: &str) -> ApiResult<DocumentDetails> {
        self.record("document_details").await?;
        let docs = self.documents.lock().unwrap();
        let d = docs
            .iter()
            .find(|d| d.doc_id == doc_id)
            .ok_or_else(Self::not_found)?;
        Ok(DocumentDetails {
            document: DocumentFileInfo {
                doc_id: d.doc_id.clone(),
                filename: d.filename.clone(),
                file_size_mb: d.file_size_mb,
                created_at: d.created_at.clone(),
                modified_at: d.created_at.clone(),
            },
            vector_store: serde_json::Value::Null,
        })
    }

    async fn delete_document(&self, doc_id: &str) -> ApiResult<DeleteResponse> {
        self.record("delete_document").await?;
        let mut docs = self.documents.lock().unwrap();
        let pos = docs
            .iter()
            .position(|d| d.doc_id == doc_id)
            .ok_or_else(Self::not_found)?;
        let removed = docs.remove(pos);
        Ok(DeleteResponse {
            success: true,
            message: format!("Document '{}' deleted.", removed.filename),
            doc_id: removed.doc_id,
            deleted_file_size_mb: removed.file_size_mb,
        })
    }

    async fn preview_cleanup(&self) -> ApiResult<CleanupPreview> {
        self.record("preview_cleanup").await?;
        let docs = self.documents.lock().unwrap();
        let targets: Vec<CleanupTarget> = docs
            .iter()
            .filter(|d| !d.status.processed)
            .map(|d| CleanupTarget {
                doc_id: d.doc_id.clone(),
                filename: d.filename.clone(),
                file_size_mb: d.file_size_mb,
                reason: "incomplete_processing".to_string(),
                issues: CleanupIssues {
                    no_vector: !d.status.vector_exists,
                    no_metadata: !d.status.metadata_exists,
                },
            })
            .collect();
        Ok(CleanupPreview {
            success: true,
            total_count: targets.len() as u64,
            total_size_mb: targets.iter().map(|t| t.file_size_mb).sum(),
            cleanup_targets: targets,
        })
    }

    async fn cleanup(&self) -> ApiResult<CleanupResponse> {
        self.record("cleanup").await?;
        let mut docs = self.documents.lock().unwrap();
        let (keep, cleaned): (Vec<_>, Vec<_>) = docs.drain(..).partition(|d| d.status.processed);
        *docs = keep;
        Ok(CleanupResponse {
            success: true,
            message: format!("{} incomplete files cleaned up.", cleaned.len()),
            cleaned_files: cleaned
                .into_iter()
                .map(|d| CleanedFile {
                    doc_id: d.doc_id,
                    filename: d.filename,
                    reason: "incomplete_processing".to_string(),
                })
                .collect(),
        })
    }

    async fn delete_selected(&self, doc_ids: &[String]) -> ApiResult<DeleteSelectedResponse> {
        self.record("delete_selected").await?;
        let mut docs = self.documents.lock().unwrap();
        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for id in doc_ids {
            match docs.iter().position(|d| &d.doc_id == id) {
                Some(pos) => {
                    let d = docs.remove(pos);
                    deleted.push(DeletedFile {
                        doc_id: d.doc_id,
                        filename: d.filename,
                        file_size_mb: d.file_size_mb,
                    });
                }
                None => failed.push(FailedFile {
                    doc_id: id.clone(),
                    filename: None,
                    reason: "not found".to_string(),
                }),
            }
        }
        Ok(DeleteSelectedResponse {
            success: true,
            message: format!("{} documents deleted.", deleted.len()),
            total_deleted_size_mb: deleted.iter().map(|d| d.file_size_mb).sum(),
            deleted_files: deleted,
            failed_files: failed,
        })
    }

    async fn rename_document(
        &self,
        doc_id: &str,
        new_filename: &str,
    ) -> ApiResult<RenameResponse> {
        self.record("rename_document").await?;
        let mut docs = self.documents.lock().unwrap();
        let d = docs
            .iter_mut()
            .find(|d| d.doc_id == doc_id)
            .ok_or_else(Self::not_found)?;
        let mut new_name = new_filename.to_string();
        if !new_name.to_lowercase().ends_with(".pdf") {
            new_name.push_str(".pdf");
        }
        let old = std::mem::replace(&mut d.filename, new_name.clone());
        Ok(RenameResponse {
            success: true,
            message: format!("{} -> {}", old, new_name),
            doc_id: doc_id.to_string(),
            old_filename: old,
            new_filename: new_name,
        })
    }

    async fn statistics(&self) -> ApiResult<SystemStatistics> {
        self.record("statistics").await?;
        let docs = self.documents.lock().unwrap();
        let mut stats = SystemStatistics::default();
        stats.document_statistics.total_documents = docs.len() as u64;
        stats.vector_statistics.total_vectors = docs.len() as u64 * 4;
        stats.system_status.gemini_api = "success".to_string();
        stats.system_status.embedding_model = EmbeddingModelStatus {
            loaded: true,
            model_name: Some("jhgan/ko-sbert-sts".to_string()),
        };
        Ok(stats)
    }

    async fn health(&self) -> ApiResult<HealthReport> {
        self.record("health").await?;
        Ok(HealthReport {
            status: "healthy".to_string(),
            timestamp: None,
            system: serde_json::Value::Null,
            error: None,
        })
    }

    async fn server_info(&self) -> ApiResult<ServerInfo> {
        self.record("server_info").await?;
        Ok(ServerInfo {
            message: "asKNOU Backend API".to_string(),
            description: String::new(),
            version: "1.0.0".to_string(),
            endpoints: Default::default(),
        })
    }
}
