//! Plain-text rendering for the terminal.
//!
//! Everything here returns a `String` so the CLI decides where it goes
//! and tests can compare output directly.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::admin::CombinedStatistics;
use crate::chat::{Message, MessageBody, Role};
use crate::models::{
    CleanupPreview, DocumentDetails, DocumentSummary, SearchResponse, SourceCitation,
    UploadStatus,
};

/// Human-readable byte count.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Sizes the backend already reports in megabytes.
pub fn format_size_mb(mb: f64) -> String {
    format!("{:.2} MB", mb)
}

/// Message timestamp, hours and minutes in local time.
pub fn format_time(ts: &DateTime<Local>) -> String {
    ts.format("%H:%M").to_string()
}

/// The backend's ISO creation time as `YYYY-MM-DD HH:MM`. Unparseable
/// values are shown as sent.
pub fn format_created_at(raw: &str) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => naive.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Unix seconds (fractional) as local `YYYY-MM-DD HH:MM`.
pub fn format_unix_time(secs: f64) -> String {
    match Local.timestamp_opt(secs.trunc() as i64, 0).single() {
        Some(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        None => format!("{}", secs),
    }
}

/// Similarity score as a whole percentage.
pub fn score_percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

pub fn render_sources(sources: &[SourceCitation]) -> String {
    let mut out = String::new();
    if sources.is_empty() {
        return out;
    }
    let _ = writeln!(out, "  Sources:");
    for (i, s) in sources.iter().enumerate() {
        let _ = writeln!(
            out,
            "   {}. {} (p.{}, relevance {})",
            i + 1,
            s.filename,
            s.page,
            score_percent(s.score)
        );
    }
    out
}

pub fn render_message(message: &Message) -> String {
    let speaker = match message.role {
        Role::User => "You",
        Role::Bot => "asKNOU",
    };
    let mut out = format!(
        "[{}] {}: {}\n",
        format_time(&message.timestamp),
        speaker,
        message.text()
    );
    if let MessageBody::Answer { sources, .. } = &message.body {
        out.push_str(&render_sources(sources));
    }
    out
}

pub fn render_search(response: &SearchResponse) -> String {
    let mut out = format!(
        "{} result(s) for \"{}\"\n",
        response.total_results, response.query
    );
    for hit in &response.results {
        let _ = writeln!(
            out,
            "\n{}. {} (p.{}) score {}",
            hit.rank,
            hit.filename,
            hit.page,
            score_percent(hit.score)
        );
        let preview = hit.content_preview.trim();
        if !preview.is_empty() {
            let _ = writeln!(out, "   {}", preview);
        }
    }
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub fn render_upload_status(status: &UploadStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Document:  {}", status.doc_id);
    let _ = writeln!(out, "PDF:       {}", yes_no(status.pdf_exists));
    let _ = writeln!(out, "Vectors:   {}", yes_no(status.vector_exists));
    let _ = writeln!(out, "Metadata:  {}", yes_no(status.metadata_exists));
    let _ = writeln!(out, "Size:      {}", format_file_size(status.file_size));
    if let Some(created) = status.created_at {
        let _ = writeln!(out, "Created:   {}", format_unix_time(created));
    }
    out
}

fn status_label(doc: &DocumentSummary) -> &'static str {
    if doc.status.processed {
        "processed"
    } else {
        "incomplete"
    }
}

/// Document table. Selected rows are marked with `*`.
pub fn render_documents(documents: &[DocumentSummary], selection: &BTreeSet<String>) -> String {
    if documents.is_empty() {
        return "No documents uploaded.\n".to_string();
    }
    let name_width = documents
        .iter()
        .map(|d| d.filename.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(8, 48);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<36}  {:<name_width$}  {:>10}  {:<16}  STATUS",
        "ID", "FILENAME", "SIZE", "CREATED"
    );
    for doc in documents {
        let mark = if selection.contains(&doc.doc_id) { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{} {:<36}  {:<name_width$}  {:>10}  {:<16}  {}",
            mark,
            doc.doc_id,
            doc.filename,
            format_size_mb(doc.file_size_mb),
            format_created_at(&doc.created_at),
            status_label(doc)
        );
    }
    out
}

pub fn render_document_details(details: &DocumentDetails) -> String {
    let d = &details.document;
    let mut out = String::new();
    let _ = writeln!(out, "Document:  {}", d.doc_id);
    let _ = writeln!(out, "Filename:  {}", d.filename);
    let _ = writeln!(out, "Size:      {}", format_size_mb(d.file_size_mb));
    let _ = writeln!(out, "Created:   {}", format_created_at(&d.created_at));
    let _ = writeln!(out, "Modified:  {}", format_created_at(&d.modified_at));
    if !details.vector_store.is_null() {
        let _ = writeln!(out, "Vectors:   {}", details.vector_store);
    }
    out
}

pub fn render_statistics(stats: &CombinedStatistics) -> String {
    let docs = &stats.documents;
    let vectors = &stats.system.vector_statistics;
    let status = &stats.system.system_status;

    let mut out = String::new();
    let _ = writeln!(out, "asKNOU Statistics");
    let _ = writeln!(out, "=================");
    let _ = writeln!(out);
    let _ = writeln!(out, "  Documents:   {}", docs.total_documents);
    let _ = writeln!(out, "  Processed:   {}", docs.processed_documents);
    let _ = writeln!(out, "  Pending:     {}", docs.pending_processing);
    let _ = writeln!(out, "  Total size:  {}", format_size_mb(docs.total_size_mb));
    let _ = writeln!(out);
    let _ = writeln!(out, "  Vectors:     {}", vectors.total_vectors);
    let _ = writeln!(out, "  Chunks:      {}", vectors.total_chunks);
    let _ = writeln!(
        out,
        "  Avg chunks:  {:.1} per document",
        vectors.average_chunks_per_doc
    );
    let _ = writeln!(out);
    let model = match (status.embedding_model.loaded, &status.embedding_model.model_name) {
        (true, Some(name)) => format!("loaded ({})", name),
        (true, None) => "loaded".to_string(),
        (false, _) => "not loaded".to_string(),
    };
    let _ = writeln!(out, "  Embedding:   {}", model);
    let _ = writeln!(
        out,
        "  LLM:         {}",
        if status.llm_connected() {
            "connected"
        } else {
            "disconnected"
        }
    );
    out
}

pub fn render_cleanup_preview(preview: &CleanupPreview) -> String {
    if preview.cleanup_targets.is_empty() {
        return "Nothing to clean up.\n".to_string();
    }
    let mut out = format!(
        "{} incomplete file(s), {} total:\n",
        preview.total_count,
        format_size_mb(preview.total_size_mb)
    );
    for t in &preview.cleanup_targets {
        let mut issues = Vec::new();
        if t.issues.no_vector {
            issues.push("no vectors");
        }
        if t.issues.no_metadata {
            issues.push("no metadata");
        }
        let _ = writeln!(
            out,
            "  - {} ({}) {}",
            t.filename,
            format_size_mb(t.file_size_mb),
            issues.join(", ")
        );
    }
    out
}
