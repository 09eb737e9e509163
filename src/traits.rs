//! The seam between the pages and the backend.
//!
//! [`RagApi`] has one method per backend operation. [`ApiClient`](crate::client::ApiClient)
//! implements it over HTTP. The chat panel, upload form and admin console
//! only ever see the trait, so they can be driven by an in-memory double.
//!
//! ```text
//! ┌───────────┐ ┌────────────┐ ┌──────────────┐
//! │ ChatPanel │ │ UploadForm │ │ AdminConsole │
//! └─────┬─────┘ └─────┬──────┘ └──────┬───────┘
//!       └─────────────┼───────────────┘
//!                     ▼
//!               dyn RagApi ──▶ ApiClient ──▶ HTTP
//! ```
//!
//! No method retries. A failure is returned as-is and the caller decides
//! what to show.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{
    CleanupPreview, CleanupResponse, DeleteResponse, DeleteSelectedResponse, DocumentDetails,
    DocumentListResponse, HealthReport, QaTestReport, QuestionRequest, QuestionResponse,
    RenameResponse, SearchResponse, ServerInfo, SystemStatistics, UploadResponse, UploadStatus,
};

pub type ApiResult<T> = Result<T, ApiError>;

#[async_trait]
pub trait RagApi: Send + Sync {
    /// `POST /upload/pdf` as multipart field `file`.
    async fn upload_pdf(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<UploadResponse>;

    /// `GET /upload/status/{doc_id}`
    async fn upload_status(&self, doc_id: &str) -> ApiResult<UploadStatus>;

    /// `POST /ask/`: retrieve and generate an answer.
    async fn ask(&self, request: &QuestionRequest) -> ApiResult<QuestionResponse>;

    /// `POST /ask/search`: retrieval only, no generated answer.
    async fn search(&self, request: &QuestionRequest) -> ApiResult<SearchResponse>;

    /// `GET /ask/test`
    async fn test_qa(&self) -> ApiResult<QaTestReport>;

    /// `GET /admin/documents`: document list plus aggregate statistics.
    async fn list_documents(&self) -> ApiResult<DocumentListResponse>;

    /// `GET /admin/documents/{doc_id}`
    async fn document_details(&self, doc_id: &str) -> ApiResult<DocumentDetails>;

    /// `DELETE /admin/documents/{doc_id}`
    async fn delete_document(&self, doc_id: &str) -> ApiResult<DeleteResponse>;

    /// `GET /admin/cleanup/preview`
    async fn preview_cleanup(&self) -> ApiResult<CleanupPreview>;

    /// `POST /admin/cleanup`: remove documents missing vector or metadata artifacts.
    async fn cleanup(&self) -> ApiResult<CleanupResponse>;

    /// `POST /admin/delete-selected` with a JSON array of ids.
    async fn delete_selected(&self, doc_ids: &[String]) -> ApiResult<DeleteSelectedResponse>;

    /// `PUT /admin/documents/{doc_id}/filename?new_filename=...`
    async fn rename_document(&self, doc_id: &str, new_filename: &str)
        -> ApiResult<RenameResponse>;

    /// `GET /admin/statistics`
    async fn statistics(&self) -> ApiResult<SystemStatistics>;

    /// `GET /health`
    async fn health(&self) -> ApiResult<HealthReport>;

    /// `GET /`
    async fn server_info(&self) -> ApiResult<ServerInfo>;
}
