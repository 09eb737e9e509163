//! Admin console: document list, statistics, bulk selection and the
//! confirmation dialogs around every destructive action.
//!
//! The console never edits its document list locally. Every mutating action
//! follows one pattern:
//!
//! 1. call the backend,
//! 2. raise a success or error [`Notification`],
//! 3. reissue the full [`AdminConsole::load_data`] fan-out.
//!
//! `load_data` awaits the document list and the system statistics together.
//! If either fails, one error notification is raised and the previously
//! loaded data stays as it was.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{
    CleanupPreview, DocumentListStatistics, DocumentSummary, SystemStatistics, UploadResponse,
};
use crate::traits::RagApi;

/// How long a notification stays current.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.raised_at)
            .to_std()
            .map(|age| age < NOTIFICATION_TTL)
            .unwrap_or(true)
    }
}

/// Statistics from both halves of the load fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedStatistics {
    pub documents: DocumentListStatistics,
    pub system: SystemStatistics,
}

/// The confirmation dialog currently open, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    None,
    Cleanup(CleanupPreview),
    DeleteSelected,
    Rename { doc_id: String, draft: String },
}

pub struct AdminConsole {
    api: Arc<dyn RagApi>,
    documents: Vec<DocumentSummary>,
    statistics: Option<CombinedStatistics>,
    selection: BTreeSet<String>,
    modal: Modal,
    notifications: Vec<Notification>,
    loading: bool,
}

impl AdminConsole {
    pub fn new(api: Arc<dyn RagApi>) -> Self {
        Self {
            api,
            documents: Vec::new(),
            statistics: None,
            selection: BTreeSet::new(),
            modal: Modal::None,
            notifications: Vec::new(),
            loading: false,
        }
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn statistics(&self) -> Option<&CombinedStatistics> {
        self.statistics.as_ref()
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drain queued notifications, oldest first. Ones past
    /// [`NOTIFICATION_TTL`] are dropped.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        let now = Utc::now();
        std::mem::take(&mut self.notifications)
            .into_iter()
            .filter(|n| n.is_current(now))
            .collect()
    }

    /// The most recent notification, while it is still current.
    pub fn latest_notification(&self) -> Option<&Notification> {
        self.notifications
            .last()
            .filter(|n| n.is_current(Utc::now()))
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            NotificationKind::Error => tracing::warn!(%message, "admin notification"),
            _ => tracing::info!(%message, "admin notification"),
        }
        self.notifications.push(Notification {
            kind,
            message,
            raised_at: Utc::now(),
        });
    }

    // ============ Loading ============

    pub async fn load_data(&mut self) {
        self.loading = true;
        let api = Arc::clone(&self.api);
        let result = tokio::try_join!(api.list_documents(), api.statistics());
        match result {
            Ok((list, system)) => {
                self.documents = list.documents;
                self.statistics = Some(CombinedStatistics {
                    documents: list.statistics,
                    system,
                });
                // Drop selections for documents that no longer exist.
                let ids: BTreeSet<&str> = self.documents.iter().map(|d| d.doc_id.as_str()).collect();
                self.selection.retain(|id| ids.contains(id.as_str()));
            }
            Err(e) => {
                self.notify(NotificationKind::Error, format!("Failed to load data: {}", e));
            }
        }
        self.loading = false;
    }

    // ============ Single delete ============

    pub async fn delete_document(&mut self, doc_id: &str, filename: &str) {
        match self.api.delete_document(doc_id).await {
            Ok(_) => self.notify(
                NotificationKind::Success,
                format!("{} was deleted.", filename),
            ),
            Err(e) => self.notify(
                NotificationKind::Error,
                format!("Delete failed: {}", e.user_message()),
            ),
        }
        self.load_data().await;
    }

    // ============ Cleanup ============

    /// Fetch the cleanup preview and open the confirmation dialog.
    pub async fn open_cleanup(&mut self) -> bool {
        match self.api.preview_cleanup().await {
            Ok(preview) => {
                self.modal = Modal::Cleanup(preview);
                true
            }
            Err(e) => {
                self.notify(
                    NotificationKind::Error,
                    format!("Cleanup preview failed: {}", e.user_message()),
                );
                false
            }
        }
    }

    pub async fn confirm_cleanup(&mut self) {
        if !matches!(self.modal, Modal::Cleanup(_)) {
            self.notify(NotificationKind::Info, "No cleanup is pending.");
            return;
        }
        match self.api.cleanup().await {
            Ok(response) => {
                self.notify(NotificationKind::Success, response.message);
                self.modal = Modal::None;
            }
            Err(e) => self.notify(
                NotificationKind::Error,
                format!("Cleanup failed: {}", e.user_message()),
            ),
        }
        self.load_data().await;
    }

    // ============ Selection ============

    /// Add `doc_id` to the selection; selecting twice is a no-op.
    pub fn select(&mut self, doc_id: &str) {
        self.selection.insert(doc_id.to_string());
    }

    pub fn toggle_selection(&mut self, doc_id: &str) {
        if !self.selection.remove(doc_id) {
            self.selection.insert(doc_id.to_string());
        }
    }

    pub fn is_all_selected(&self) -> bool {
        !self.documents.is_empty() && self.selection.len() == self.documents.len()
    }

    /// Select every document, or clear the selection if all are selected.
    pub fn select_all(&mut self) {
        if self.selection.len() == self.documents.len() {
            self.selection.clear();
        } else {
            self.selection = self.documents.iter().map(|d| d.doc_id.clone()).collect();
        }
    }

    /// Open the bulk-delete dialog. An empty selection is refused here,
    /// without a network call.
    pub fn request_delete_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            self.notify(NotificationKind::Error, "Select documents to delete.");
            return false;
        }
        self.modal = Modal::DeleteSelected;
        true
    }

    pub async fn confirm_delete_selected(&mut self) {
        if self.selection.is_empty() {
            self.notify(NotificationKind::Error, "Select documents to delete.");
            return;
        }
        let ids: Vec<String> = self.selection.iter().cloned().collect();
        match self.api.delete_selected(&ids).await {
            Ok(response) => {
                self.notify(NotificationKind::Success, response.message);
                self.modal = Modal::None;
                self.selection.clear();
            }
            Err(e) => self.notify(
                NotificationKind::Error,
                format!("Delete failed: {}", e.user_message()),
            ),
        }
        self.load_data().await;
    }

    // ============ Rename ============

    /// Open the rename dialog with the current name minus its `.pdf`.
    pub fn begin_rename(&mut self, doc_id: &str) -> bool {
        let draft = self
            .documents
            .iter()
            .find(|d| d.doc_id == doc_id)
            .map(|d| d.filename.replacen(".pdf", "", 1));
        match draft {
            Some(draft) => {
                self.modal = Modal::Rename {
                    doc_id: doc_id.to_string(),
                    draft,
                };
                true
            }
            None => {
                self.notify(
                    NotificationKind::Error,
                    format!("Unknown document: {}", doc_id),
                );
                false
            }
        }
    }

    pub fn set_rename_draft(&mut self, value: &str) {
        if let Modal::Rename { draft, .. } = &mut self.modal {
            *draft = value.to_string();
        }
    }

    pub async fn confirm_rename(&mut self) {
        let target = match &self.modal {
            Modal::Rename { doc_id, draft } if !draft.trim().is_empty() => {
                Some((doc_id.clone(), draft.trim().to_string()))
            }
            _ => None,
        };
        let Some((doc_id, new_name)) = target else {
            self.notify(NotificationKind::Error, "Please enter a filename.");
            return;
        };
        match self.api.rename_document(&doc_id, &new_name).await {
            Ok(response) => {
                self.notify(NotificationKind::Success, response.message);
                self.modal = Modal::None;
            }
            Err(e) => self.notify(
                NotificationKind::Error,
                format!("Rename failed: {}", e.user_message()),
            ),
        }
        self.load_data().await;
    }

    // ============ Dialogs & upload ============

    /// Close whatever dialog is open. Dismissing bulk delete also clears
    /// the selection.
    pub fn dismiss_modal(&mut self) {
        if matches!(self.modal, Modal::DeleteSelected) {
            self.selection.clear();
        }
        self.modal = Modal::None;
    }

    pub async fn on_upload_success(&mut self, response: &UploadResponse) {
        self.notify(
            NotificationKind::Success,
            format!(
                "{} uploaded! ({} chunks created)",
                response.filename, response.total_chunks
            ),
        );
        self.load_data().await;
    }

    pub fn on_upload_error(&mut self, message: &str) {
        self.notify(NotificationKind::Error, message);
    }
}
