//! Error types for prov-core

use chrono::{DateTime, Utc};

use crate::backup::VerifyReport;

/// Result type for prov-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in prov-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Another invocation holds the backup lock; retryable
    #[error("operation already in progress: locked by {operation:?} since {since}")]
    LockTimeout {
        operation: String,
        since: DateTime<Utc>,
    },

    /// The requested backup id does not exist; caller error
    #[error("backup not found: {id}")]
    BackupNotFound { id: String },

    /// I/O failure while copying, hashing, or writing a backup; retryable
    #[error("backup creation failed: {message}")]
    BackupCreateFailed { message: String },

    /// Recomputed state disagrees with the recorded checksum or structure
    #[error("integrity check failed for backup {id}: {} issue(s) found", .report.issues.len())]
    IntegrityCheckFailed { id: String, report: VerifyReport },

    /// The backup's metadata record is unreadable or unparsable
    #[error("metadata corrupted for backup {id}")]
    MetadataCorrupted { id: String },

    /// Provider profile not found
    #[error("provider not found: {name}")]
    ProviderNotFound { name: String },

    /// Provider profile already exists
    #[error("provider already exists: {name}")]
    ProviderExists { name: String },

    /// Provider profile failed validation
    #[error("invalid provider: {reason}")]
    InvalidProvider { reason: String },

    /// Unknown shell name for alias generation
    #[error("unsupported shell: {name}")]
    UnsupportedShell { name: String },

    /// Filesystem error from prov-fs
    #[error(transparent)]
    Fs(#[from] prov_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}
