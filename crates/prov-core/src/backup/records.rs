//! On-disk records and verification reports for backups

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version for backup metadata and integrity records
pub const BACKUP_VERSION: u32 = 1;

/// File name of the primary metadata record inside a backup directory
pub const METADATA_FILE: &str = "metadata.json";

/// File name of the secondary integrity record inside a backup directory
pub const INTEGRITY_FILE: &str = ".integrity";

/// Which watched sources were present when the backup was taken.
///
/// A `false` flag means the source was absent that session, not that the
/// copy failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupContents {
    /// Agent configuration directory (`claude/`)
    pub claude_dir: bool,
    /// Provider profiles directory (`providers/`)
    pub providers: bool,
    /// Active-provider record (`config.json`)
    pub config: bool,
}

/// Primary metadata record, `metadata.json` in the backup directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Record schema version
    pub version: u32,
    /// Timestamp-derived backup id; doubles as the directory name
    pub id: String,
    /// Caller-supplied description
    pub description: String,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Total bytes copied into the snapshot
    pub size_bytes: u64,
    /// Number of content files covered by the checksum
    pub files: u64,
    /// Canonical `sha256:<hex>` digest over the snapshot tree
    pub checksum: String,
    /// Which watched sources the snapshot contains
    pub contents: BackupContents,
}

/// Secondary integrity record, `.integrity` in the backup directory.
///
/// Written after the metadata record; duplicates the checksum and file count
/// so the two can be cross-checked during verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityRecord {
    /// Record schema version
    pub version: u32,
    /// When the record was written
    pub created: DateTime<Utc>,
    /// Canonical `sha256:<hex>` digest, duplicated from metadata
    pub checksum: String,
    /// File count, duplicated from metadata
    pub files: u64,
}

/// One listed backup, including ones whose metadata could not be read.
#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    /// Backup id (directory name)
    pub id: String,
    /// Description from metadata, or a synthesized corruption marker
    pub description: String,
    /// Creation time; `None` when metadata was unreadable
    pub created: Option<DateTime<Utc>>,
    /// Snapshot size; zero when metadata was unreadable
    pub size_bytes: u64,
    /// True when the metadata record was missing or unparsable
    pub corrupted: bool,
}

/// One discrepancy found while verifying a backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyIssue {
    /// `metadata.json` is missing or unparsable
    MissingMetadata,
    /// `.integrity` is missing or unparsable
    MissingIntegrity,
    /// Recomputed tree digest differs from the recorded one
    ChecksumMismatch { expected: String, actual: String },
    /// Recomputed file count differs from the recorded one
    FileCountMismatch { expected: u64, actual: u64 },
    /// Metadata and the integrity record disagree with each other
    RecordsDisagree { field: &'static str },
    /// A subdirectory or file the metadata claims to contain is missing
    MissingComponent { name: String },
}

impl std::fmt::Display for VerifyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingMetadata => write!(f, "metadata record is missing or unparsable"),
            Self::MissingIntegrity => write!(f, "integrity record is missing or unparsable"),
            Self::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch: recorded {expected}, recomputed {actual}")
            }
            Self::FileCountMismatch { expected, actual } => {
                write!(f, "file count mismatch: recorded {expected}, recomputed {actual}")
            }
            Self::RecordsDisagree { field } => {
                write!(f, "metadata and integrity record disagree on {field}")
            }
            Self::MissingComponent { name } => {
                write!(f, "expected component missing from snapshot: {name}")
            }
        }
    }
}

/// Aggregate result of verifying one backup.
///
/// Every discrepancy found is reported; verification never stops at the
/// first problem.
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    /// Backup id that was verified
    pub id: String,
    /// All discrepancies found; empty means the backup is intact
    pub issues: Vec<VerifyIssue>,
}

impl VerifyReport {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issues: Vec::new(),
        }
    }

    /// True when no discrepancies were found.
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}
