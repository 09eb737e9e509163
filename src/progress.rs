//! Upload progress reporting.
//!
//! The upload form's counter is cosmetic: it climbs on a fixed timer while
//! the request is in flight and only reaches 100 when the server answers.
//! Events are emitted on **stderr** so stdout stays parseable for scripts.

use std::io::Write;

/// A single progress event for an upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadProgressEvent {
    /// Request issued; counter at zero.
    Started { file_name: String },
    /// Simulated tick. `percent` never exceeds the configured cap.
    Advanced { file_name: String, percent: u8 },
    /// Server accepted the file; counter jumps to 100.
    Completed { file_name: String },
    /// Upload failed; counter reset to zero.
    Failed { file_name: String, message: String },
}

impl UploadProgressEvent {
    pub fn percent(&self) -> u8 {
        match self {
            UploadProgressEvent::Started { .. } | UploadProgressEvent::Failed { .. } => 0,
            UploadProgressEvent::Advanced { percent, .. } => *percent,
            UploadProgressEvent::Completed { .. } => 100,
        }
    }
}

/// Reports upload progress. Implementations write to stderr (human or JSON).
pub trait UploadProgressReporter: Send + Sync {
    fn report(&self, event: UploadProgressEvent);
}

/// Human-friendly progress on stderr: "upload 학사일정.pdf  [#####     ]  50%".
pub struct StderrProgress;

impl UploadProgressReporter for StderrProgress {
    fn report(&self, event: UploadProgressEvent) {
        let line = match &event {
            UploadProgressEvent::Started { file_name } => {
                format!("upload {}  uploading...\n", file_name)
            }
            UploadProgressEvent::Advanced { file_name, percent } => {
                format!("upload {}  {}  {:>3}%\n", file_name, bar(*percent), percent)
            }
            UploadProgressEvent::Completed { file_name } => {
                format!("upload {}  {}  100%\n", file_name, bar(100))
            }
            UploadProgressEvent::Failed { file_name, message } => {
                format!("upload {}  failed: {}\n", file_name, message)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl UploadProgressReporter for JsonProgress {
    fn report(&self, event: UploadProgressEvent) {
        let percent = event.percent();
        let obj = match &event {
            UploadProgressEvent::Started { file_name } => serde_json::json!({
                "event": "progress",
                "file": file_name,
                "phase": "started",
                "percent": percent
            }),
            UploadProgressEvent::Advanced { file_name, .. } => serde_json::json!({
                "event": "progress",
                "file": file_name,
                "phase": "uploading",
                "percent": percent
            }),
            UploadProgressEvent::Completed { file_name } => serde_json::json!({
                "event": "progress",
                "file": file_name,
                "phase": "completed",
                "percent": percent
            }),
            UploadProgressEvent::Failed { file_name, message } => serde_json::json!({
                "event": "progress",
                "file": file_name,
                "phase": "failed",
                "percent": percent,
                "message": message
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl UploadProgressReporter for NoProgress {
    fn report(&self, _event: UploadProgressEvent) {}
}

fn bar(percent: u8) -> String {
    let filled = (percent.min(100) as usize) / 10;
    format!("[{}{}]", "#".repeat(filled), " ".repeat(10 - filled))
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse the `--progress` flag value. `auto` defers to [`Self::default_for_tty`].
    pub fn from_flag(flag: &str) -> anyhow::Result<Self> {
        match flag {
            "auto" => Ok(Self::default_for_tty()),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            "off" => Ok(ProgressMode::Off),
            other => anyhow::bail!(
                "Unknown progress mode: '{}'. Must be auto, human, json, or off.",
                other
            ),
        }
    }

    pub fn reporter(&self) -> Box<dyn UploadProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
