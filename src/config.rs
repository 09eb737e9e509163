//! TOML configuration parsing.
//!
//! Every section is optional: a missing file yields [`Config::default`],
//! which points at a backend on `http://localhost:8000`. Environment
//! variables are applied on top of the file so deployments can override the
//! API URL and admin credentials without editing it.
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000"
//! timeout_secs = 300
//!
//! [session]
//! path = ".asknou/session.json"
//! ttl_hours = 24
//!
//! [admin]
//! id = "admin"
//! password_sha256 = "<hex digest>"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::upload::DEFAULT_MAX_UPLOAD_BYTES;

pub const ENV_API_URL: &str = "ASKNOU_API_URL";
pub const ENV_ADMIN_ID: &str = "ASKNOU_ADMIN_ID";
pub const ENV_ADMIN_PASSWORD_SHA256: &str = "ASKNOU_ADMIN_PASSWORD_SHA256";
pub const ENV_SESSION_PATH: &str = "ASKNOU_SESSION_PATH";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// One budget for every request, sized for server-side PDF processing.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default)]
    pub top_k: Option<u32>,
    #[serde(default = "default_max_question_chars")]
    pub max_question_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            top_k: None,
            max_question_chars: default_max_question_chars(),
        }
    }
}

fn default_max_question_chars() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_step")]
    pub step: u8,
    #[serde(default = "default_cap")]
    pub cap: u8,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            tick_ms: default_tick_ms(),
            step: default_step(),
            cap: default_cap(),
            settle_ms: default_settle_ms(),
        }
    }
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}
fn default_tick_ms() -> u64 {
    200
}
fn default_step() -> u8 {
    10
}
fn default_cap() -> u8 {
    90
}
fn default_settle_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
            ttl_hours: default_ttl_hours(),
        }
    }
}

fn default_session_path() -> PathBuf {
    PathBuf::from(".asknou/session.json")
}
/// Upper bound for `session.ttl_hours`: one year.
pub const MAX_TTL_HOURS: u64 = 24 * 365;

fn default_ttl_hours() -> u64 {
    24
}

/// Admin login identity. The password is only ever held as a SHA-256 digest.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub password_sha256: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub filter: Option<String>,
}

impl Config {
    /// Overlay environment overrides using `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(id) = lookup(ENV_ADMIN_ID).filter(|v| !v.is_empty()) {
            self.admin.id = Some(id);
        }
        if let Some(digest) = lookup(ENV_ADMIN_PASSWORD_SHA256).filter(|v| !v.is_empty()) {
            self.admin.password_sha256 = Some(digest);
        }
        if let Some(path) = lookup(ENV_SESSION_PATH).filter(|v| !v.is_empty()) {
            self.session.path = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            bail!("api.base_url must not be empty");
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            bail!(
                "api.base_url must start with http:// or https:// (got '{}')",
                self.api.base_url
            );
        }
        if self.api.timeout_secs == 0 {
            bail!("api.timeout_secs must be > 0");
        }
        if self.chat.max_question_chars == 0 {
            bail!("chat.max_question_chars must be > 0");
        }
        if self.upload.step == 0 {
            bail!("upload.step must be > 0");
        }
        if self.upload.cap > 100 {
            bail!("upload.cap must be <= 100");
        }
        if self.upload.tick_ms == 0 {
            bail!("upload.tick_ms must be > 0");
        }
        if self.session.ttl_hours == 0 || self.session.ttl_hours > MAX_TTL_HOURS {
            bail!(
                "session.ttl_hours must be between 1 and {} (got {})",
                MAX_TTL_HOURS,
                self.session.ttl_hours
            );
        }
        if let Some(digest) = &self.admin.password_sha256 {
            let valid = digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit());
            if !valid {
                bail!("admin.password_sha256 must be a 64-character hex SHA-256 digest");
            }
        }
        Ok(())
    }
}

/// Load configuration from `path`, apply process environment overrides,
/// and validate the result.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?
    } else {
        Config::default()
    };

    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}
