//! PDF upload form.
//!
//! Selection runs a validation gate that never touches the network: the
//! declared content type must be `application/pdf` and the size must not
//! exceed the ceiling. Uploading then races the request against a fixed
//! interval timer that advances a cosmetic progress counter up to a cap;
//! only the server's answer takes it to 100.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::config::UploadConfig;
use crate::error::ApiError;
use crate::models::UploadResponse;
use crate::progress::{UploadProgressEvent, UploadProgressReporter};
use crate::traits::RagApi;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Shown when a failure carries neither a server detail nor a message.
pub const UPLOAD_FALLBACK_MESSAGE: &str = "An error occurred during upload.";

/// A file the user picked, described by what it claims to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

impl FileCandidate {
    /// Describe the file at `path` from its metadata.
    ///
    /// `declared_type` overrides the content type inferred from the
    /// extension, the way a browser reports whatever type the OS claims.
    pub fn from_path(path: &Path, declared_type: Option<&str>) -> Result<Self> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("Cannot read file: {}", path.display()))?;
        if !meta.is_file() {
            bail!("Not a regular file: {}", path.display());
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Path has no file name: {}", path.display()))?;
        let content_type = declared_type
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for(path).to_string());

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            content_type,
            size: meta.len(),
        })
    }
}

/// Content type implied by a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_CONTENT_TYPE,
        _ => "application/octet-stream",
    }
}

/// Client-side validation failures. None of these reach the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("Only PDF files can be uploaded.")]
    NotPdf { content_type: String },
    #[error("File size cannot exceed {}MB.", .limit / (1024 * 1024))]
    TooLarge { size: u64, limit: u64 },
}

/// The validation gate run before any network call.
pub fn validate(candidate: &FileCandidate, max_bytes: u64) -> Result<(), UploadRejection> {
    if candidate.content_type != PDF_CONTENT_TYPE {
        return Err(UploadRejection::NotPdf {
            content_type: candidate.content_type.clone(),
        });
    }
    if candidate.size > max_bytes {
        return Err(UploadRejection::TooLarge {
            size: candidate.size,
            limit: max_bytes,
        });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file selected.")]
    NothingSelected,
    #[error(transparent)]
    Rejected(#[from] UploadRejection),
    /// Transport or server failure, already reduced to the user-facing message.
    #[error("{0}")]
    Failed(String),
}

/// Timing and limits of the upload form.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_bytes: u64,
    pub tick: Duration,
    pub step: u8,
    pub cap: u8,
    pub settle: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl From<&UploadConfig> for UploadSettings {
    fn from(cfg: &UploadConfig) -> Self {
        Self {
            max_bytes: cfg.max_bytes,
            tick: Duration::from_millis(cfg.tick_ms),
            step: cfg.step,
            cap: cfg.cap.min(100),
            settle: Duration::from_millis(cfg.settle_ms),
        }
    }
}

/// Selected-file and progress state of the upload form.
pub struct UploadForm {
    settings: UploadSettings,
    selected: Option<FileCandidate>,
    progress: u8,
    uploading: bool,
}

impl UploadForm {
    pub fn new(settings: UploadSettings) -> Self {
        Self {
            settings,
            selected: None,
            progress: 0,
            uploading: false,
        }
    }

    pub fn selected(&self) -> Option<&FileCandidate> {
        self.selected.as_ref()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Run the validation gate and keep the file if it passes.
    /// A rejected file leaves any previous selection in place.
    pub fn select(&mut self, candidate: FileCandidate) -> Result<(), UploadRejection> {
        validate(&candidate, self.settings.max_bytes)?;
        self.selected = Some(candidate);
        Ok(())
    }

    pub fn remove(&mut self) {
        self.selected = None;
        self.progress = 0;
    }

    /// Upload the selected file.
    ///
    /// On success the selection is cleared after the settle delay and the
    /// response is returned. On failure progress resets to zero and the
    /// selection is kept so the user can retry.
    pub async fn upload(
        &mut self,
        api: &dyn RagApi,
        reporter: &dyn UploadProgressReporter,
    ) -> Result<UploadResponse, UploadError> {
        let candidate = self.selected.clone().ok_or(UploadError::NothingSelected)?;
        validate(&candidate, self.settings.max_bytes)?;

        self.uploading = true;
        self.progress = 0;
        reporter.report(UploadProgressEvent::Started {
            file_name: candidate.file_name.clone(),
        });

        let outcome = self.send_with_progress(api, reporter, &candidate).await;
        self.uploading = false;

        match outcome {
            Ok(response) => {
                self.progress = 100;
                reporter.report(UploadProgressEvent::Completed {
                    file_name: candidate.file_name.clone(),
                });
                tokio::time::sleep(self.settings.settle).await;
                self.selected = None;
                self.progress = 0;
                Ok(response)
            }
            Err(message) => {
                self.progress = 0;
                reporter.report(UploadProgressEvent::Failed {
                    file_name: candidate.file_name.clone(),
                    message: message.clone(),
                });
                Err(UploadError::Failed(message))
            }
        }
    }

    async fn send_with_progress(
        &mut self,
        api: &dyn RagApi,
        reporter: &dyn UploadProgressReporter,
        candidate: &FileCandidate,
    ) -> std::result::Result<UploadResponse, String> {
        let bytes = tokio::fs::read(&candidate.path)
            .await
            .map_err(|e| format!("Cannot read {}: {}", candidate.path.display(), e))?;

        let request = api.upload_pdf(&candidate.file_name, bytes);
        tokio::pin!(request);

        let mut ticker = tokio::time::interval(self.settings.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick of an interval fires immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                result = &mut request => {
                    return result.map_err(|e| failure_message(&e));
                }
                _ = ticker.tick() => {
                    let next = self
                        .progress
                        .saturating_add(self.settings.step)
                        .min(self.settings.cap);
                    if next != self.progress {
                        self.progress = next;
                        reporter.report(UploadProgressEvent::Advanced {
                            file_name: candidate.file_name.clone(),
                            percent: next,
                        });
                    }
                }
            }
        }
    }
}

/// Server detail, else the transport message, else the generic fallback.
pub fn failure_message(err: &ApiError) -> String {
    let message = err.user_message();
    if message.trim().is_empty() {
        UPLOAD_FALLBACK_MESSAGE.to_string()
    } else {
        message
    }
}
