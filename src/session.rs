//! Admin login gate.
//!
//! This is a convenience gate, not a security boundary: the backend's admin
//! routes are not authenticated, so anything here only decides whether the
//! admin commands are offered. The state machine is
//! `no-flag → logged-in → expired → no-flag`: a successful login stores a
//! flag with its timestamp, and every [`AuthContext::check`] compares that
//! timestamp against the injected [`Clock`] and clears the record once the
//! TTL has passed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::{AdminConfig, SessionConfig};

// ============ Clock ============

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============ Storage ============

/// The persisted login flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub logged_in: bool,
    /// Milliseconds since the Unix epoch.
    pub login_time_ms: i64,
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionRecord>>;
    fn save(&self, record: &SessionRecord) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Session record kept as a small JSON file.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {}", self.path.display()))?;
        // A corrupt record counts as no record.
        match serde_json::from_str(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create session directory: {}", parent.display())
                })?;
            }
        }
        let json = serde_json::to_string(record)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove session file: {}", self.path.display())
            }),
        }
    }
}

#[derive(Default)]
pub struct MemorySessionStore(Mutex<Option<SessionRecord>>);

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        Ok(*self.0.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = Some(*record);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

// ============ Credentials ============

/// Decides whether an id/password pair may open the admin console.
///
/// Implement this to delegate verification to a server endpoint.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, id: &str, password: &str) -> Result<bool, LoginError>;
}

/// Credentials from configuration: an id and the SHA-256 of the password.
pub struct ConfiguredCredentials {
    id: String,
    password_sha256: [u8; 32],
}

impl ConfiguredCredentials {
    pub fn new(id: impl Into<String>, password_sha256_hex: &str) -> Result<Self> {
        let bytes = hex::decode(password_sha256_hex.trim())
            .context("admin password digest is not valid hex")?;
        let password_sha256: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("admin password digest must be 32 bytes"))?;
        Ok(Self {
            id: id.into(),
            password_sha256,
        })
    }
}

#[async_trait]
impl CredentialVerifier for ConfiguredCredentials {
    async fn verify(&self, id: &str, password: &str) -> Result<bool, LoginError> {
        let digest = Sha256::digest(password.as_bytes());
        let password_ok = constant_time_eq(digest.as_slice(), &self.password_sha256);
        Ok(id == self.id && password_ok)
    }
}

/// Used when no admin identity is configured: every login is refused.
pub struct NoCredentials;

#[async_trait]
impl CredentialVerifier for NoCredentials {
    async fn verify(&self, _id: &str, _password: &str) -> Result<bool, LoginError> {
        Err(LoginError::NotConfigured)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Hex SHA-256 of `password`, the form `[admin].password_sha256` expects.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Pick the verifier matching the `[admin]` section.
pub fn verifier_from_config(admin: &AdminConfig) -> Result<Box<dyn CredentialVerifier>> {
    match (&admin.id, &admin.password_sha256) {
        (Some(id), Some(digest)) => Ok(Box::new(ConfiguredCredentials::new(id.clone(), digest)?)),
        _ => Ok(Box::new(NoCredentials)),
    }
}

// ============ Auth context ============

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Please enter your {0}.")]
    MissingField(&'static str),
    #[error("Invalid ID or password.")]
    InvalidCredentials,
    #[error("Admin credentials are not configured (set [admin] id and password_sha256).")]
    NotConfigured,
    #[error("Session lifetime is out of range.")]
    TtlOutOfRange,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn {
        since: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionState::LoggedIn { .. })
    }
}

/// Explicit authentication context handed to the admin commands.
pub struct AuthContext {
    store: Box<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    verifier: Box<dyn CredentialVerifier>,
    ttl: Duration,
}

impl AuthContext {
    pub fn new(
        store: Box<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        verifier: Box<dyn CredentialVerifier>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            verifier,
            ttl,
        }
    }

    /// File-backed context on the system clock, as configured.
    pub fn from_config(session: &SessionConfig, admin: &AdminConfig) -> Result<Self> {
        let ttl = i64::try_from(session.ttl_hours)
            .ok()
            .and_then(Duration::try_hours)
            .context("session.ttl_hours is too large")?;
        Ok(Self::new(
            Box::new(FileSessionStore::new(session.path.clone())),
            Arc::new(SystemClock),
            verifier_from_config(admin)?,
            ttl,
        ))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The mount-time check. An expired record is cleared.
    pub fn check(&self) -> Result<SessionState> {
        let Some(record) = self.store.load()? else {
            return Ok(SessionState::LoggedOut);
        };
        if !record.logged_in {
            return Ok(SessionState::LoggedOut);
        }

        let since = match Utc.timestamp_millis_opt(record.login_time_ms).single() {
            Some(t) => t,
            None => {
                self.store.clear()?;
                return Ok(SessionState::LoggedOut);
            }
        };
        let now = self.clock.now();
        let expires_at = since.checked_add_signed(self.ttl);
        if let (Some(expires_at), true) = (expires_at, now.signed_duration_since(since) < self.ttl)
        {
            Ok(SessionState::LoggedIn { since, expires_at })
        } else {
            tracing::debug!(login_time = %since, "admin session expired");
            self.store.clear()?;
            Ok(SessionState::LoggedOut)
        }
    }

    pub async fn login(&self, id: &str, password: &str) -> Result<SessionState, LoginError> {
        if id.trim().is_empty() {
            return Err(LoginError::MissingField("ID"));
        }
        if password.trim().is_empty() {
            return Err(LoginError::MissingField("password"));
        }
        if !self.verifier.verify(id, password).await? {
            return Err(LoginError::InvalidCredentials);
        }

        let since = self.clock.now();
        let expires_at = since
            .checked_add_signed(self.ttl)
            .ok_or(LoginError::TtlOutOfRange)?;
        self.store.save(&SessionRecord {
            logged_in: true,
            login_time_ms: since.timestamp_millis(),
        })?;
        Ok(SessionState::LoggedIn { since, expires_at })
    }

    pub fn logout(&self) -> Result<()> {
        self.store.clear()
    }
}
