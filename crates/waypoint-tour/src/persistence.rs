#![forbid(unsafe_code)]

//! Per-user tour status persistence.
//!
//! The user record lives in an external document store. The engine reads
//! `isNewUser` / `hasCompletedTour` on sign-in and writes the terminal action
//! (completed or skipped) when the tour ends.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    TourStatusRecorder                         │
//! │   - Applies DegradedPersistencePolicy on write failure        │
//! │   - Holds at most one deferred record for retry               │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    TourStatusStore                            │
//! │   - MemoryStatusStore: in-memory (testing, ephemeral)         │
//! │   - FileStatusStore: JSON file (requires state-persistence)   │
//! │   - host adapters for the real document store                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Read fails on sign-in | Logged, tour not offered this session |
//! | Write fails on skip/complete | Logged; the in-memory transition already happened |
//! | Missing record | Treated as a new user, tour offered |
//!
//! A failed write leaves `hasCompletedTour` stale, so the tour may be offered
//! again next session. That is the documented cost of
//! [`DegradedPersistencePolicy::LogAndContinue`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during status store operations.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    Serialization(String),
    /// Stored data is corrupted or a lock was poisoned.
    Corruption(String),
    /// Backend is not reachable (offline, signed out, quota).
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StoreError::Corruption(msg) => write!(f, "storage corruption: {msg}"),
            StoreError::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Serialization(_) | StoreError::Corruption(_) | StoreError::Unavailable(_) => {
                None
            }
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

/// Tour fields of the persisted user record.
///
/// Field names match the document store (`isNewUser`, `hasCompletedTour`,
/// `tourCompletedAt`, `tourSkippedAt`). Timestamps are Unix epoch millis.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserTourStatus {
    pub is_new_user: bool,
    pub has_completed_tour: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tour_completed_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tour_skipped_at: Option<u64>,
}

impl UserTourStatus {
    /// A freshly created account that has not seen the tour.
    #[must_use]
    pub fn new_user() -> Self {
        Self {
            is_new_user: true,
            ..Self::default()
        }
    }
}

/// Whether to offer the tour to a user with this (possibly absent) record.
#[must_use]
pub fn should_offer_tour(status: Option<&UserTourStatus>) -> bool {
    match status {
        None => true,
        Some(status) => status.is_new_user && !status.has_completed_tour,
    }
}

/// How the tour ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalAction {
    Completed,
    Skipped,
}

impl TerminalAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }
}

/// A terminal action stamped with the wall-clock time it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalRecord {
    pub action: TerminalAction,
    pub at_millis: u64,
}

impl TerminalRecord {
    #[must_use]
    pub const fn new(action: TerminalAction, at_millis: u64) -> Self {
        Self { action, at_millis }
    }

    /// Write this record into a status. Only the matching timestamp is set.
    pub fn apply(&self, status: &mut UserTourStatus) {
        status.has_completed_tour = true;
        match self.action {
            TerminalAction::Completed => status.tour_completed_at = Some(self.at_millis),
            TerminalAction::Skipped => status.tour_skipped_at = Some(self.at_millis),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Pluggable backend for the persisted user record.
pub trait TourStatusStore: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Read the tour status for `user_id`. `Ok(None)` when no record exists.
    fn load(&self, user_id: &str) -> StoreResult<Option<UserTourStatus>>;

    /// Persist a terminal action for `user_id`, creating the record if needed.
    fn record_terminal(&self, user_id: &str, record: &TerminalRecord) -> StoreResult<()>;

    /// Check if the backend is available and functional.
    fn is_available(&self) -> bool {
        true
    }
}

impl<T: TourStatusStore + ?Sized> TourStatusStore for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&self, user_id: &str) -> StoreResult<Option<UserTourStatus>> {
        (**self).load(user_id)
    }

    fn record_terminal(&self, user_id: &str, record: &TerminalRecord) -> StoreResult<()> {
        (**self).record_terminal(user_id, record)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Store (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory store for tests and signed-out previews.
///
/// Can be switched into a failing mode to simulate a backend outage.
#[derive(Default)]
pub struct MemoryStatusStore {
    data: RwLock<HashMap<String, UserTourStatus>>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStatusStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one user record.
    #[must_use]
    pub fn with_status(self, user_id: impl Into<String>, status: UserTourStatus) -> Self {
        if let Ok(mut guard) = self.data.write() {
            guard.insert(user_id.into(), status);
        }
        self
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful terminal writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current record for `user_id`, bypassing the failure switch.
    #[must_use]
    pub fn snapshot(&self, user_id: &str) -> Option<UserTourStatus> {
        self.data.read().ok()?.get(user_id).cloned()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store set to fail".into()));
        }
        Ok(())
    }
}

impl TourStatusStore for MemoryStatusStore {
    fn name(&self) -> &str {
        "MemoryStatusStore"
    }

    fn load(&self, user_id: &str) -> StoreResult<Option<UserTourStatus>> {
        self.check_available()?;
        let guard = self
            .data
            .read()
            .map_err(|_| StoreError::Corruption("lock poisoned".into()))?;
        Ok(guard.get(user_id).cloned())
    }

    fn record_terminal(&self, user_id: &str, record: &TerminalRecord) -> StoreResult<()> {
        self.check_available()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| StoreError::Corruption("lock poisoned".into()))?;
        record.apply(guard.entry(user_id.to_string()).or_default());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_available(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for MemoryStatusStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.data.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryStatusStore")
            .field("users", &count)
            .field("writes", &self.write_count())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Store (requires state-persistence feature)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "state-persistence")]
mod file_store {
    use super::*;
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::{Path, PathBuf};

    /// On-disk layout.
    #[derive(Serialize, Deserialize)]
    struct StatusFile {
        format_version: u32,
        users: HashMap<String, UserTourStatus>,
    }

    impl StatusFile {
        const FORMAT_VERSION: u32 = 1;

        fn new() -> Self {
            Self {
                format_version: Self::FORMAT_VERSION,
                users: HashMap::new(),
            }
        }
    }

    /// JSON file store keyed by user id.
    ///
    /// Writes use a temporary file + rename so a crash never leaves a
    /// half-written file behind.
    ///
    /// ```json
    /// {
    ///   "format_version": 1,
    ///   "users": {
    ///     "u-123": { "isNewUser": true, "hasCompletedTour": true, "tourSkippedAt": 1760000000000 }
    ///   }
    /// }
    /// ```
    pub struct FileStatusStore {
        path: PathBuf,
    }

    impl FileStatusStore {
        /// The file does not need to exist; it is created on first write.
        #[must_use]
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }

        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn temp_path(&self) -> PathBuf {
            let mut tmp = self.path.clone();
            tmp.set_extension("json.tmp");
            tmp
        }

        fn read_file(&self) -> StoreResult<StatusFile> {
            if !self.path.exists() {
                return Ok(StatusFile::new());
            }
            let reader = BufReader::new(File::open(&self.path)?);
            let file: StatusFile = serde_json::from_reader(reader).map_err(|e| {
                StoreError::Serialization(format!("failed to parse status file: {e}"))
            })?;
            if file.format_version != StatusFile::FORMAT_VERSION {
                return Err(StoreError::Corruption(format!(
                    "unsupported status file version {}",
                    file.format_version
                )));
            }
            Ok(file)
        }

        fn write_file(&self, file: &StatusFile) -> StoreResult<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let tmp_path = self.temp_path();
            {
                let mut writer = BufWriter::new(File::create(&tmp_path)?);
                serde_json::to_writer_pretty(&mut writer, file).map_err(|e| {
                    StoreError::Serialization(format!("failed to serialize status file: {e}"))
                })?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        }
    }

    impl TourStatusStore for FileStatusStore {
        fn name(&self) -> &str {
            "FileStatusStore"
        }

        fn load(&self, user_id: &str) -> StoreResult<Option<UserTourStatus>> {
            Ok(self.read_file()?.users.remove(user_id))
        }

        fn record_terminal(&self, user_id: &str, record: &TerminalRecord) -> StoreResult<()> {
            let mut file = self.read_file()?;
            record.apply(file.users.entry(user_id.to_string()).or_default());
            self.write_file(&file)?;
            tracing::debug!(
                path = %self.path.display(),
                user_id,
                action = record.action.as_str(),
                "saved tour status"
            );
            Ok(())
        }
    }

    impl fmt::Debug for FileStatusStore {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileStatusStore")
                .field("path", &self.path)
                .finish()
        }
    }
}

#[cfg(feature = "state-persistence")]
pub use file_store::FileStatusStore;

// ─────────────────────────────────────────────────────────────────────────────
// Degraded persistence
// ─────────────────────────────────────────────────────────────────────────────

/// What to do when a terminal write fails.
///
/// Neither variant ever blocks or reverses the in-memory transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegradedPersistencePolicy {
    /// Log at `warn` and drop the write.
    #[default]
    LogAndContinue,
    /// Log at `warn` and keep the record; retry on the next sign-in of the
    /// same user.
    RetryOnNextSignIn,
}

impl DegradedPersistencePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LogAndContinue => "log-and-continue",
            Self::RetryOnNextSignIn => "retry-on-next-sign-in",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "log-and-continue" => Some(Self::LogAndContinue),
            "retry-on-next-sign-in" => Some(Self::RetryOnNextSignIn),
            _ => None,
        }
    }
}

/// Result of handing a record to the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Written,
    /// Failed; kept for a later retry.
    Deferred,
    /// Failed; discarded.
    Dropped,
}

/// Writes terminal records through a store, applying the degraded policy.
pub struct TourStatusRecorder {
    store: Box<dyn TourStatusStore>,
    policy: DegradedPersistencePolicy,
    pending: Option<(String, TerminalRecord)>,
}

impl TourStatusRecorder {
    #[must_use]
    pub fn new(store: Box<dyn TourStatusStore>, policy: DegradedPersistencePolicy) -> Self {
        Self {
            store,
            policy,
            pending: None,
        }
    }

    /// Recorder over an in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MemoryStatusStore::new()),
            DegradedPersistencePolicy::default(),
        )
    }

    #[must_use]
    pub const fn policy(&self) -> DegradedPersistencePolicy {
        self.policy
    }

    #[must_use]
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// The deferred record, if a write failed under `RetryOnNextSignIn`.
    #[must_use]
    pub fn pending(&self) -> Option<(&str, &TerminalRecord)> {
        self.pending
            .as_ref()
            .map(|(user_id, record)| (user_id.as_str(), record))
    }

    /// Read the status for `user_id`. Failures are logged and yield `Err`.
    pub fn load(&self, user_id: &str) -> StoreResult<Option<UserTourStatus>> {
        self.store.load(user_id).inspect_err(|err| {
            tracing::warn!(
                backend = %self.store.name(),
                user_id,
                error = %err,
                "failed to read tour status"
            );
        })
    }

    /// Best-effort write of a terminal record.
    ///
    /// A store that reports itself unavailable is not written to; the record
    /// goes straight to the degraded policy.
    pub fn record(&mut self, user_id: &str, record: TerminalRecord) -> PersistOutcome {
        let result = if self.store.is_available() {
            self.store.record_terminal(user_id, &record)
        } else {
            Err(StoreError::Unavailable(format!(
                "{} reported unavailable",
                self.store.name()
            )))
        };
        match result {
            Ok(()) => {
                tracing::debug!(
                    backend = %self.store.name(),
                    user_id,
                    action = record.action.as_str(),
                    "tour status persisted"
                );
                if self
                    .pending
                    .as_ref()
                    .is_some_and(|(pending_user, _)| pending_user == user_id)
                {
                    self.pending = None;
                }
                PersistOutcome::Written
            }
            Err(err) => {
                tracing::warn!(
                    backend = %self.store.name(),
                    user_id,
                    action = record.action.as_str(),
                    policy = self.policy.as_str(),
                    error = %err,
                    "failed to persist tour status"
                );
                match self.policy {
                    DegradedPersistencePolicy::LogAndContinue => PersistOutcome::Dropped,
                    DegradedPersistencePolicy::RetryOnNextSignIn => {
                        self.pending = Some((user_id.to_string(), record));
                        PersistOutcome::Deferred
                    }
                }
            }
        }
    }

    /// Retry the deferred record if it belongs to `user_id`.
    pub fn retry_pending(&mut self, user_id: &str) -> Option<PersistOutcome> {
        let (pending_user, record) = self.pending.take()?;
        if pending_user != user_id {
            self.pending = Some((pending_user, record));
            return None;
        }
        Some(self.record(user_id, record))
    }
}

impl fmt::Debug for TourStatusRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourStatusRecorder")
            .field("backend", &self.store.name())
            .field("policy", &self.policy)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
