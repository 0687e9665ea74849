//! Process-level mutual exclusion via a lock sentinel
//!
//! Each CLI invocation is a separate short-lived process; the sentinel file
//! is the sole shared mutable resource coordinating them. Creation uses
//! `create_new` for atomic create-if-absent semantics, and the holder keeps
//! an `fs2` advisory lock on the open handle so a crashed holder can be
//! detected immediately rather than waiting out the staleness threshold.
//! The JSON sentinel content is diagnostics only: operation name, owner pid,
//! creation time.

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// Schema version for the lock sentinel record
const LOCK_VERSION: u32 = 1;

/// Diagnostic record serialized into the lock sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Record schema version
    pub version: u32,
    /// Name of the operation holding the lock ("backup", "restore", "reset")
    pub operation: String,
    /// Pid of the owning process
    pub pid: u32,
    /// When the lock was taken
    pub created: DateTime<Utc>,
}

impl LockInfo {
    fn new(operation: &str) -> Self {
        Self {
            version: LOCK_VERSION,
            operation: operation.to_string(),
            pid: std::process::id(),
            created: Utc::now(),
        }
    }

    /// Age of the lock relative to now.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.created).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Tuning knobs for [`LockManager::acquire`].
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    /// Total wall-clock budget before giving up
    pub timeout: Duration,
    /// Sleep between polling attempts
    pub retry_interval: Duration,
    /// Hard cap on polling attempts, independent of the timeout
    pub max_retries: u32,
    /// Age past which an abandoned sentinel is reclaimed
    pub stale_after: Duration,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retry_interval: Duration::from_millis(250),
            max_retries: 120,
            stale_after: Duration::from_secs(600),
        }
    }
}

impl AcquireOptions {
    /// Derive options from persisted settings.
    pub fn from_settings(settings: &crate::Settings) -> Self {
        Self {
            timeout: settings.lock_timeout(),
            retry_interval: settings.lock_retry_interval(),
            stale_after: settings.lock_stale_after(),
            ..Self::default()
        }
    }
}

/// RAII handle for a held lock; releasing happens on drop.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    file: Option<File>,
    info: LockInfo,
}

impl LockGuard {
    /// Diagnostic record written into the sentinel.
    pub fn info(&self) -> &LockInfo {
        &self.info
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove lock sentinel");
            }
        }
    }
}

/// Advisory lock manager over a single sentinel path.
#[derive(Debug, Clone)]
pub struct LockManager {
    lock_path: PathBuf,
}

impl LockManager {
    pub fn new(lock_path: impl Into<PathBuf>) -> Self {
        Self {
            lock_path: lock_path.into(),
        }
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Acquire the lock, polling until success or the budget is exhausted.
    ///
    /// Each attempt tries to create the sentinel with create-if-absent
    /// semantics. When the sentinel already exists it is inspected: a record
    /// that fails to parse, is older than `stale_after`, or is no longer
    /// flock-held by a live process is deleted and the attempt repeats
    /// without sleeping. Otherwise the call sleeps `retry_interval` and
    /// retries until `timeout` or `max_retries` runs out, then fails with
    /// [`Error::LockTimeout`] carrying the holder's operation and start time.
    pub fn acquire(&self, operation: &str, opts: &AcquireOptions) -> Result<LockGuard> {
        let deadline = Instant::now() + opts.timeout;
        let mut attempts = 0u32;

        loop {
            match self.try_create(operation) {
                Ok(Some(guard)) => {
                    tracing::debug!(operation, path = %self.lock_path.display(), "lock acquired");
                    return Ok(guard);
                }
                Ok(None) => {
                    if self.reclaim_if_stale(opts.stale_after)? {
                        // Sentinel was stale and is gone; retry immediately,
                        // but never past the caller's budget
                        if Instant::now() >= deadline {
                            return Err(self.timeout_error());
                        }
                        continue;
                    }
                    attempts += 1;
                    if attempts >= opts.max_retries || Instant::now() >= deadline {
                        return Err(self.timeout_error());
                    }
                    std::thread::sleep(opts.retry_interval);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Forcibly remove the sentinel. Removing a nonexistent lock is not an
    /// error; normal release happens via [`LockGuard`] drop.
    pub fn release(&self) -> Result<()> {
        match fs::remove_file(&self.lock_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Fs(prov_fs::Error::io(&self.lock_path, e))),
        }
    }

    /// Run `f` while holding the lock; released on success, error, and
    /// unwind alike.
    pub fn with_lock<T>(
        &self,
        operation: &str,
        opts: &AcquireOptions,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let _guard = self.acquire(operation, opts)?;
        f()
    }

    /// Read the current holder's diagnostic record, if any.
    pub fn holder(&self) -> Option<LockInfo> {
        let content = fs::read_to_string(&self.lock_path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// One creation attempt. `Ok(Some)` on success, `Ok(None)` when the
    /// sentinel already exists.
    fn try_create(&self, operation: &str) -> Result<Option<LockGuard>> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Fs(prov_fs::Error::io(parent, e)))?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => return Err(Error::Fs(prov_fs::Error::io(&self.lock_path, e))),
        };

        // Hold the advisory lock for the lifetime of the guard so liveness
        // is observable by other processes
        file.try_lock_exclusive()
            .map_err(|_| Error::Fs(prov_fs::Error::LockFailed {
                path: self.lock_path.clone(),
            }))?;

        let info = LockInfo::new(operation);
        let content = serde_json::to_string_pretty(&info)?;
        file.write_all(content.as_bytes())
            .map_err(|e| Error::Fs(prov_fs::Error::io(&self.lock_path, e)))?;
        file.sync_all()
            .map_err(|e| Error::Fs(prov_fs::Error::io(&self.lock_path, e)))?;
        prov_fs::restrict_permissions(&self.lock_path)?;

        Ok(Some(LockGuard {
            path: self.lock_path.clone(),
            file: Some(file),
            info,
        }))
    }

    /// Inspect an existing sentinel and delete it when it is provably
    /// abandoned. Returns true when the sentinel was removed (or vanished on
    /// its own) and acquisition should retry immediately.
    ///
    /// Reclamation opens a bounded window where two processes may both
    /// believe they hold the lock; the guarded operations are idempotent
    /// copies, so the window is accepted.
    fn reclaim_if_stale(&self, stale_after: Duration) -> Result<bool> {
        let file = match File::open(&self.lock_path) {
            Ok(file) => file,
            // Holder released between our attempts
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(Error::Fs(prov_fs::Error::io(&self.lock_path, e))),
        };

        let content = fs::read_to_string(&self.lock_path)
            .map_err(|e| Error::Fs(prov_fs::Error::io(&self.lock_path, e)))?;

        match serde_json::from_str::<LockInfo>(&content) {
            Err(_) => {
                // An empty or garbled record can also be a live holder caught
                // between create_new and write_all; only reclaim once the
                // flock check shows no live owner
                if Self::owner_is_gone(&file) {
                    tracing::warn!(path = %self.lock_path.display(), "removing unparsable lock sentinel");
                    self.release()?;
                    return Ok(true);
                }
                Ok(false)
            }
            Ok(info) if info.age() > stale_after => {
                tracing::warn!(
                    operation = %info.operation,
                    pid = info.pid,
                    age_secs = info.age().as_secs(),
                    "removing stale lock sentinel"
                );
                self.release()?;
                Ok(true)
            }
            Ok(info) => {
                if Self::owner_is_gone(&file) {
                    tracing::warn!(
                        operation = %info.operation,
                        pid = info.pid,
                        "removing lock sentinel abandoned by dead process"
                    );
                    self.release()?;
                    return Ok(true);
                }
                Ok(false)
            }
        }
    }

    /// A live holder keeps an exclusive flock on the sentinel for the
    /// lifetime of its guard; if we can take the lock, the owning process is
    /// gone.
    fn owner_is_gone(file: &File) -> bool {
        if file.try_lock_exclusive().is_ok() {
            let _ = file.unlock();
            true
        } else {
            false
        }
    }

    fn timeout_error(&self) -> Error {
        match self.holder() {
            Some(info) => Error::LockTimeout {
                operation: info.operation,
                since: info.created,
            },
            // Holder vanished while we were giving up; report what we know
            None => Error::LockTimeout {
                operation: "unknown".to_string(),
                since: Utc::now(),
            },
        }
    }
}
