//! Backup engine: creation, listing, restoration, verification, retention
//!
//! Snapshots the watched sources (agent directory, provider profiles, the
//! active-provider record) into timestamped directories under `backups/`,
//! stamps each snapshot with a tree checksum, and verifies it before any
//! restore. Mutual exclusion across CLI invocations comes from
//! [`LockManager`]; integrity from [`prov_fs::hash_tree`].

mod records;

pub use records::{
    BACKUP_VERSION, BackupContents, BackupEntry, BackupMetadata, INTEGRITY_FILE, IntegrityRecord,
    METADATA_FILE, VerifyIssue, VerifyReport,
};

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ConfigLayout, Settings};
use crate::lock::{AcquireOptions, LockManager};
use crate::{Error, Result};

/// Description stamped on the safety snapshot taken before each restore
const PRE_RESTORE_DESCRIPTION: &str = "pre-restore";

/// Orchestrates backup creation, listing, restoration, deletion, retention
/// cleanup, and verification.
pub struct BackupManager {
    layout: ConfigLayout,
    settings: Settings,
    lock: LockManager,
}

impl BackupManager {
    pub fn new(layout: ConfigLayout, settings: Settings) -> Self {
        let lock = LockManager::new(layout.lock_file());
        Self {
            layout,
            settings,
            lock,
        }
    }

    /// The lock manager guarding this configuration root. Shared with other
    /// lock-holding flows (reset).
    pub fn lock(&self) -> &LockManager {
        &self.lock
    }

    /// Acquire options derived from the persisted settings.
    pub fn acquire_options(&self) -> AcquireOptions {
        AcquireOptions::from_settings(&self.settings)
    }

    /// Safety snapshot for the reset flow; the caller already holds the
    /// lock.
    pub(crate) fn create_for_reset(&self) -> Result<BackupMetadata> {
        self.create_locked("pre-reset", self.settings.auto_clean)
    }

    fn backup_dir(&self, id: &str) -> PathBuf {
        self.layout.backups_dir().join(id)
    }

    /// Create a snapshot of the current live state.
    ///
    /// Holds the lock for the whole operation. When `auto_clean` is enabled,
    /// retention cleanup runs first so disk usage stays bounded.
    pub fn create_backup(&self, description: &str) -> Result<BackupMetadata> {
        self.lock.with_lock("backup", &self.acquire_options(), || {
            self.create_locked(description, self.settings.auto_clean)
        })
    }

    /// Restore a snapshot over the live state.
    ///
    /// The target's checksum is verified first and any discrepancy aborts
    /// with [`Error::IntegrityCheckFailed`] unless `force` overrides it. A
    /// pre-restore backup of the live state is taken before anything is
    /// overwritten, so a restore is itself undoable. A failed copy
    /// mid-restore leaves the live state partially restored; the pre-restore
    /// snapshot guarantees recoverability.
    pub fn restore_backup(&self, id: &str, force: bool) -> Result<BackupMetadata> {
        prov_fs::validate_identifier(id)?;
        self.lock.with_lock("restore", &self.acquire_options(), || {
            let dir = self.backup_dir(id);
            if !dir.is_dir() {
                return Err(Error::BackupNotFound { id: id.to_string() });
            }
            let metadata = self.read_metadata(id)?;

            if force {
                tracing::warn!(id, "integrity verification skipped by force override");
            } else {
                let report = self.verify_inner(id)?;
                if !report.is_ok() {
                    return Err(Error::IntegrityCheckFailed {
                        id: id.to_string(),
                        report,
                    });
                }
            }

            // Safety net before overwriting anything; retention is skipped so
            // it cannot delete the snapshot being restored
            let pre = self.create_locked(PRE_RESTORE_DESCRIPTION, false)?;
            tracing::info!(id, pre_restore = %pre.id, "live state snapshotted before restore");

            if metadata.contents.claude_dir {
                self.restore_dir(&dir.join("claude"), &self.layout.agent_dir())?;
            }
            if metadata.contents.providers {
                self.restore_dir(&dir.join("providers"), &self.layout.providers_dir())?;
            }
            if metadata.contents.config {
                self.restore_file(&dir.join("config.json"), &self.layout.config_file())?;
            }

            tracing::info!(id, "restore complete");
            Ok(metadata)
        })
    }

    /// List all backups, newest first.
    ///
    /// A backup directory without a readable metadata record is corrupted,
    /// not absent: it is still listed, flagged, with a synthesized
    /// description.
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        let root = self.layout.backups_dir();
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&root).map_err(|e| prov_fs::Error::io(&root, e))? {
            let entry = entry.map_err(|e| prov_fs::Error::io(&root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            let listed = match self.read_metadata(&id) {
                Ok(metadata) => BackupEntry {
                    id,
                    description: metadata.description,
                    created: Some(metadata.created),
                    size_bytes: metadata.size_bytes,
                    corrupted: false,
                },
                Err(_) => BackupEntry {
                    id,
                    description: "(metadata corrupted)".to_string(),
                    created: None,
                    size_bytes: 0,
                    corrupted: true,
                },
            };
            entries.push(listed);
        }

        // Ids are lexically sortable timestamps
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(entries)
    }

    /// Recompute the backup's checksum and file count and report every
    /// discrepancy against the metadata and integrity records.
    pub fn verify_backup(&self, id: &str) -> Result<VerifyReport> {
        prov_fs::validate_identifier(id)?;
        if !self.backup_dir(id).is_dir() {
            return Err(Error::BackupNotFound { id: id.to_string() });
        }
        self.verify_inner(id)
    }

    /// Delete a single backup.
    pub fn delete_backup(&self, id: &str) -> Result<()> {
        prov_fs::validate_identifier(id)?;
        let dir = self.backup_dir(id);
        if !dir.is_dir() {
            return Err(Error::BackupNotFound { id: id.to_string() });
        }
        fs::remove_dir_all(&dir).map_err(|e| prov_fs::Error::io(&dir, e))?;
        tracing::info!(id, "backup deleted");
        Ok(())
    }

    /// Delete every backup beyond the `keep` newest, oldest first.
    ///
    /// Individual deletion failures are logged and skipped; the batch never
    /// aborts. Returns the ids actually deleted.
    pub fn clean_old_backups(&self, keep: usize) -> Result<Vec<String>> {
        let root = self.layout.backups_dir();
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&root).map_err(|e| prov_fs::Error::io(&root, e))? {
            let entry = entry.map_err(|e| prov_fs::Error::io(&root, e))?;
            if entry.path().is_dir() {
                ids.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        ids.sort_by(|a, b| b.cmp(a));

        let mut deleted = Vec::new();
        for id in ids.into_iter().skip(keep) {
            let dir = root.join(&id);
            match fs::remove_dir_all(&dir) {
                Ok(()) => {
                    tracing::info!(id = %id, "old backup removed by retention");
                    deleted.push(id);
                }
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "retention could not remove backup; skipping");
                }
            }
        }
        Ok(deleted)
    }

    /// Creation body, caller must hold the lock.
    fn create_locked(&self, description: &str, run_clean: bool) -> Result<BackupMetadata> {
        let root = self.layout.backups_dir();
        fs::create_dir_all(&root).map_err(|e| prov_fs::Error::io(&root, e))?;
        prov_fs::restrict_permissions(&root)?;

        if run_clean {
            if let Err(e) = self.clean_old_backups(self.settings.backup_keep_count) {
                tracing::warn!(error = %e, "retention cleanup failed; continuing with backup");
            }
        }

        let (id, dir) = self.fresh_backup_dir()?;
        match self.populate(&dir, &id, description) {
            Ok(metadata) => {
                tracing::info!(
                    id = %metadata.id,
                    files = metadata.files,
                    size_bytes = metadata.size_bytes,
                    "backup created"
                );
                Ok(metadata)
            }
            Err(e) => {
                // Best-effort removal of the partial snapshot
                if let Err(cleanup) = prov_fs::remove_dir_if_exists(&dir) {
                    tracing::warn!(id = %id, error = %cleanup, "could not remove partial backup");
                }
                Err(Error::BackupCreateFailed {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Allocate a timestamped id and create its directory with restricted
    /// permissions. Millisecond ids keep collisions rare; a brief retry
    /// covers back-to-back invocations.
    fn fresh_backup_dir(&self) -> Result<(String, PathBuf)> {
        for _ in 0..5 {
            let id = Utc::now().format("%Y%m%d-%H%M%S%3f").to_string();
            let dir = self.backup_dir(&id);
            match fs::create_dir(&dir) {
                Ok(()) => {
                    prov_fs::restrict_permissions(&dir)?;
                    return Ok((id, dir));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    std::thread::sleep(std::time::Duration::from_millis(2));
                }
                Err(e) => return Err(Error::Fs(prov_fs::Error::io(&dir, e))),
            }
        }
        Err(Error::BackupCreateFailed {
            message: "could not allocate a unique backup id".to_string(),
        })
    }

    /// Copy the watched sources into `dir`, stamp the checksum, and write
    /// the metadata and integrity records (in that order).
    fn populate(&self, dir: &Path, id: &str, description: &str) -> Result<BackupMetadata> {
        let mut stats = prov_fs::CopyStats::default();
        let mut contents = BackupContents::default();

        let agent = self.layout.agent_dir();
        if agent.is_dir() {
            stats.absorb(prov_fs::copy_dir_recursive(&agent, &dir.join("claude"))?);
            contents.claude_dir = true;
        }
        let providers = self.layout.providers_dir();
        if providers.is_dir() {
            stats.absorb(prov_fs::copy_dir_recursive(
                &providers,
                &dir.join("providers"),
            )?);
            contents.providers = true;
        }
        let config = self.layout.config_file();
        if config.is_file() {
            let target = dir.join("config.json");
            let bytes = fs::copy(&config, &target).map_err(|e| prov_fs::Error::io(&config, e))?;
            stats.files += 1;
            stats.bytes += bytes;
            contents.config = true;
        }

        let digest = prov_fs::hash_tree(dir, &[METADATA_FILE, INTEGRITY_FILE])?;
        let metadata = BackupMetadata {
            version: BACKUP_VERSION,
            id: id.to_string(),
            description: description.to_string(),
            created: Utc::now(),
            size_bytes: stats.bytes,
            files: digest.files,
            checksum: digest.checksum.clone(),
            contents,
        };

        let metadata_path = dir.join(METADATA_FILE);
        prov_fs::write_atomic(
            &metadata_path,
            serde_json::to_string_pretty(&metadata)?.as_bytes(),
        )?;
        prov_fs::restrict_permissions(&metadata_path)?;

        // Written after metadata so a crash between the two is detectable
        let integrity = IntegrityRecord {
            version: BACKUP_VERSION,
            created: Utc::now(),
            checksum: digest.checksum,
            files: digest.files,
        };
        let integrity_path = dir.join(INTEGRITY_FILE);
        prov_fs::write_atomic(
            &integrity_path,
            serde_json::to_string_pretty(&integrity)?.as_bytes(),
        )?;
        prov_fs::restrict_permissions(&integrity_path)?;

        Ok(metadata)
    }

    /// Read and parse a backup's metadata record.
    fn read_metadata(&self, id: &str) -> Result<BackupMetadata> {
        let path = self.backup_dir(id).join(METADATA_FILE);
        let content = fs::read_to_string(&path).map_err(|_| Error::MetadataCorrupted {
            id: id.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|_| Error::MetadataCorrupted {
            id: id.to_string(),
        })
    }

    fn read_integrity(&self, id: &str) -> Option<IntegrityRecord> {
        let path = self.backup_dir(id).join(INTEGRITY_FILE);
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Verification body; the backup directory is known to exist.
    fn verify_inner(&self, id: &str) -> Result<VerifyReport> {
        let dir = self.backup_dir(id);
        let digest = prov_fs::hash_tree(&dir, &[METADATA_FILE, INTEGRITY_FILE])?;
        let mut report = VerifyReport::new(id);

        let metadata = self.read_metadata(id).ok();
        let integrity = self.read_integrity(id);

        if metadata.is_none() {
            report.issues.push(VerifyIssue::MissingMetadata);
        }
        if integrity.is_none() {
            report.issues.push(VerifyIssue::MissingIntegrity);
        }

        if let Some(metadata) = &metadata {
            if metadata.checksum != digest.checksum {
                report.issues.push(VerifyIssue::ChecksumMismatch {
                    expected: metadata.checksum.clone(),
                    actual: digest.checksum.clone(),
                });
            }
            if metadata.files != digest.files {
                report.issues.push(VerifyIssue::FileCountMismatch {
                    expected: metadata.files,
                    actual: digest.files,
                });
            }
            if metadata.contents.claude_dir && !dir.join("claude").is_dir() {
                report.issues.push(VerifyIssue::MissingComponent {
                    name: "claude".to_string(),
                });
            }
            if metadata.contents.providers && !dir.join("providers").is_dir() {
                report.issues.push(VerifyIssue::MissingComponent {
                    name: "providers".to_string(),
                });
            }
            if metadata.contents.config && !dir.join("config.json").is_file() {
                report.issues.push(VerifyIssue::MissingComponent {
                    name: "config.json".to_string(),
                });
            }
        }

        if let Some(integrity) = &integrity {
            match &metadata {
                Some(metadata) => {
                    if metadata.checksum != integrity.checksum {
                        report
                            .issues
                            .push(VerifyIssue::RecordsDisagree { field: "checksum" });
                    }
                    if metadata.files != integrity.files {
                        report
                            .issues
                            .push(VerifyIssue::RecordsDisagree { field: "files" });
                    }
                }
                // No metadata to cross-check; compare the recomputed digest
                // against the integrity record directly
                None => {
                    if integrity.checksum != digest.checksum {
                        report.issues.push(VerifyIssue::ChecksumMismatch {
                            expected: integrity.checksum.clone(),
                            actual: digest.checksum.clone(),
                        });
                    }
                    if integrity.files != digest.files {
                        report.issues.push(VerifyIssue::FileCountMismatch {
                            expected: integrity.files,
                            actual: digest.files,
                        });
                    }
                }
            }
        }

        Ok(report)
    }

    fn restore_dir(&self, snapshot: &Path, live: &Path) -> Result<()> {
        if !snapshot.is_dir() {
            // Only reachable under force; strict verification aborts earlier
            tracing::warn!(path = %snapshot.display(), "snapshot component missing; skipping");
            return Ok(());
        }
        prov_fs::remove_dir_if_exists(live)?;
        prov_fs::copy_dir_recursive(snapshot, live)?;
        Ok(())
    }

    fn restore_file(&self, snapshot: &Path, live: &Path) -> Result<()> {
        if !snapshot.is_file() {
            tracing::warn!(path = %snapshot.display(), "snapshot component missing; skipping");
            return Ok(());
        }
        match fs::remove_file(live) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Fs(prov_fs::Error::io(live, e))),
        }
        fs::copy(snapshot, live).map_err(|e| prov_fs::Error::io(snapshot, e))?;
        Ok(())
    }
}
