//! HTTP implementation of [`RagApi`].
//!
//! One [`reqwest::Client`] is built per [`ApiClient`] with the configured
//! timeout; every call goes through [`ApiClient::send`], which logs the
//! request, the response status and any failure through `tracing`.
//!
//! There is a single failure path: no retry, no backoff. A
//! non-2xx response becomes [`ApiError::Status`] carrying the server's
//! `detail`, a network failure becomes [`ApiError::Transport`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{multipart, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::{
    CleanupPreview, CleanupResponse, DeleteResponse, DeleteSelectedResponse, DocumentDetails,
    DocumentListResponse, HealthReport, QaTestReport, QuestionRequest, QuestionResponse,
    RenameResponse, SearchResponse, ServerInfo, SystemStatistics, UploadResponse, UploadStatus,
};
use crate::traits::{ApiResult, RagApi};
use crate::upload::PDF_CONTENT_TYPE;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Send `builder`, log the exchange, and decode a 2xx JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        method: &Method,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        tracing::debug!(method = %method, path, "API request");
        let started = Instant::now();

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(method = %method, path, error = %e, "API request failed");
                return Err(ApiError::Transport(e));
            }
        };

        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let body = response.text().await.map_err(|e| {
            tracing::warn!(method = %method, path, error = %e, "API response body unreadable");
            ApiError::Transport(e)
        })?;

        if !status.is_success() {
            let err = ApiError::from_status(status, body);
            tracing::warn!(
                method = %method,
                path,
                status = status.as_u16(),
                elapsed_ms,
                detail = err.detail().unwrap_or(""),
                "API error"
            );
            return Err(err);
        }

        tracing::debug!(
            method = %method,
            path,
            status = status.as_u16(),
            elapsed_ms,
            bytes = body.len(),
            "API response"
        );

        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let builder = self.request(Method::GET, path);
        self.send(&Method::GET, path, builder).await
    }
}

/// Percent-encode a document id for use as a single path segment.
fn segment(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[async_trait]
impl RagApi for ApiClient {
    async fn upload_pdf(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<UploadResponse> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(PDF_CONTENT_TYPE)?;
        let form = multipart::Form::new().part("file", part);
        let path = "/upload/pdf";
        let builder = self.request(Method::POST, path).multipart(form);
        self.send(&Method::POST, path, builder).await
    }

    async fn upload_status(&self, doc_id: &str) -> ApiResult<UploadStatus> {
        self.get(&format!("/upload/status/{}", segment(doc_id))).await
    }

    async fn ask(&self, request: &QuestionRequest) -> ApiResult<QuestionResponse> {
        let path = "/ask/";
        let builder = self.request(Method::POST, path).json(request);
        self.send(&Method::POST, path, builder).await
    }

    async fn search(&self, request: &QuestionRequest) -> ApiResult<SearchResponse> {
        let path = "/ask/search";
        let builder = self.request(Method::POST, path).json(request);
        self.send(&Method::POST, path, builder).await
    }

    async fn test_qa(&self) -> ApiResult<QaTestReport> {
        self.get("/ask/test").await
    }

    async fn list_documents(&self) -> ApiResult<DocumentListResponse> {
        self.get("/admin/documents").await
    }

    async fn document_details(&self, doc_id: &str) -> ApiResult<DocumentDetails> {
        self.get(&format!("/admin/documents/{}", segment(doc_id))).await
    }

    async fn delete_document(&self, doc_id: &str) -> ApiResult<DeleteResponse> {
        let path = format!("/admin/documents/{}", segment(doc_id));
        let builder = self.request(Method::DELETE, &path);
        self.send(&Method::DELETE, &path, builder).await
    }

    async fn preview_cleanup(&self) -> ApiResult<CleanupPreview> {
        self.get("/admin/cleanup/preview").await
    }

    async fn cleanup(&self) -> ApiResult<CleanupResponse> {
        let path = "/admin/cleanup";
        let builder = self.request(Method::POST, path);
        self.send(&Method::POST, path, builder).await
    }

    async fn delete_selected(&self, doc_ids: &[String]) -> ApiResult<DeleteSelectedResponse> {
        let path = "/admin/delete-selected";
        let builder = self.request(Method::POST, path).json(doc_ids);
        self.send(&Method::POST, path, builder).await
    }

    async fn rename_document(
        &self,
        doc_id: &str,
        new_filename: &str,
    ) -> ApiResult<RenameResponse> {
        let path = format!("/admin/documents/{}/filename", segment(doc_id));
        let builder = self
            .request(Method::PUT, &path)
            .query(&[("new_filename", new_filename)]);
        self.send(&Method::PUT, &path, builder).await
    }

    async fn statistics(&self) -> ApiResult<SystemStatistics> {
        self.get("/admin/statistics").await
    }

    async fn health(&self) -> ApiResult<HealthReport> {
        self.get("/health").await
    }

    async fn server_info(&self) -> ApiResult<ServerInfo> {
        self.get("/").await
    }
}
