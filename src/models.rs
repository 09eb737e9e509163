//! Wire types exchanged with the asKNOU backend.
//!
//! The backend owns every document; these types are read-only snapshots
//! that the client renders and then throws away on the next refetch.
//! Optional fields default so that older or newer servers still decode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value the backend sends either as a number or as a string
/// (page numbers and chunk ids fall back to `"Unknown"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

impl Default for NumberOrText {
    fn default() -> Self {
        NumberOrText::Text(String::new())
    }
}

impl fmt::Display for NumberOrText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberOrText::Number(n) => write!(f, "{}", n),
            NumberOrText::Text(s) => f.write_str(s),
        }
    }
}

// ============ Upload ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub doc_id: String,
    pub filename: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub total_chunks: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub embedding_dimension: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadStatus {
    pub doc_id: String,
    #[serde(default)]
    pub pdf_exists: bool,
    #[serde(default)]
    pub vector_exists: bool,
    #[serde(default)]
    pub metadata_exists: bool,
    #[serde(default)]
    pub file_size: u64,
    /// Unix timestamp (seconds, fractional) of the stored PDF.
    #[serde(default)]
    pub created_at: Option<f64>,
    #[serde(default)]
    pub vector_stats: serde_json::Value,
}

// ============ Ask ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl QuestionRequest {
    pub fn new(question: impl Into<String>, top_k: Option<u32>) -> Self {
        Self {
            question: question.into(),
            top_k,
        }
    }
}

/// Backend metadata attached to an answer: where the supporting text came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub filename: String,
    #[serde(default)]
    pub page: NumberOrText,
    #[serde(default)]
    pub chunk_id: NumberOrText,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub content_preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SourceCitation>,
    #[serde(default)]
    pub retrieved_chunks: u64,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub doc_id: String,
    pub filename: String,
    #[serde(default)]
    pub page: NumberOrText,
    #[serde(default)]
    pub chunk_id: NumberOrText,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub content_preview: String,
    #[serde(default)]
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaTestReport {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub gemini_api: serde_json::Value,
    #[serde(default)]
    pub embedding_model: serde_json::Value,
    #[serde(default)]
    pub document_status: serde_json::Value,
}

// ============ Admin ============

/// The three artifact flags of a stored document plus the derived flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentStatus {
    #[serde(default)]
    pub pdf_exists: bool,
    #[serde(default)]
    pub vector_exists: bool,
    #[serde(default)]
    pub metadata_exists: bool,
    #[serde(default)]
    pub processed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub doc_id: String,
    pub filename: String,
    #[serde(default)]
    pub file_size_mb: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub status: DocumentStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentListStatistics {
    #[serde(default)]
    pub total_documents: u64,
    #[serde(default)]
    pub processed_documents: u64,
    #[serde(default)]
    pub total_size_mb: f64,
    #[serde(default)]
    pub pending_processing: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentListResponse {
    #[serde(default)]
    pub documents: Vec<DocumentSummary>,
    #[serde(default)]
    pub statistics: DocumentListStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFileInfo {
    pub doc_id: String,
    pub filename: String,
    #[serde(default)]
    pub file_size_mb: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub modified_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDetails {
    pub document: DocumentFileInfo,
    #[serde(default)]
    pub vector_store: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub deleted_file_size_mb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CleanupIssues {
    #[serde(default)]
    pub no_vector: bool,
    #[serde(default)]
    pub no_metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupTarget {
    pub doc_id: String,
    pub filename: String,
    #[serde(default)]
    pub file_size_mb: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub issues: CleanupIssues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupPreview {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub cleanup_targets: Vec<CleanupTarget>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub total_size_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedFile {
    pub doc_id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub cleaned_files: Vec<CleanedFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedFile {
    pub doc_id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub file_size_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedFile {
    pub doc_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSelectedResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub deleted_files: Vec<DeletedFile>,
    #[serde(default)]
    pub failed_files: Vec<FailedFile>,
    #[serde(default)]
    pub total_deleted_size_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub old_filename: String,
    #[serde(default)]
    pub new_filename: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentStatistics {
    #[serde(default)]
    pub total_documents: u64,
    #[serde(default)]
    pub processed_documents: u64,
    #[serde(default)]
    pub pending_documents: u64,
    #[serde(default)]
    pub total_size_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorStatistics {
    #[serde(default)]
    pub total_vectors: u64,
    #[serde(default)]
    pub total_chunks: u64,
    #[serde(default)]
    pub embedding_dimensions: Vec<u64>,
    #[serde(default)]
    pub average_chunks_per_doc: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbeddingModelStatus {
    #[serde(default)]
    pub loaded: bool,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub embedding_model: EmbeddingModelStatus,
    #[serde(default)]
    pub gemini_api: String,
    #[serde(default)]
    pub gemini_message: String,
}

impl SystemStatus {
    pub fn llm_connected(&self) -> bool {
        self.gemini_api == "success"
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemStatistics {
    #[serde(default)]
    pub document_statistics: DocumentStatistics,
    #[serde(default)]
    pub vector_statistics: VectorStatistics,
    #[serde(default)]
    pub system_status: SystemStatus,
}

// ============ System ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub system: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub endpoints: std::collections::BTreeMap<String, String>,
}
