//! Core orchestration layer for Provider Manager
//!
//! Implements the subsystems the `prov` CLI is a thin adapter over:
//!
//! - **LockManager**: process-level mutual exclusion via a lock sentinel
//!   with stale-lock reclamation
//! - **BackupManager**: multi-directory snapshots with checksum stamping,
//!   verification, restore-with-rollback, and retention cleanup
//! - **ProviderStore**: CRUD over provider profiles and the active selection
//! - **alias**: shell snippet generation for a profile
//!
//! # Architecture
//!
//! ```text
//!        prov-cli
//!            |
//!       prov-core
//!            |
//!        prov-fs
//! ```

pub mod alias;
pub mod backup;
pub mod config;
pub mod error;
pub mod lock;
pub mod provider;

pub use alias::Shell;
pub use backup::{
    BackupContents, BackupEntry, BackupManager, BackupMetadata, VerifyIssue, VerifyReport,
};
pub use config::{ConfigLayout, Settings};
pub use error::{Error, Result};
pub use lock::{AcquireOptions, LockGuard, LockInfo, LockManager};
pub use provider::{ActiveConfig, Provider, ProviderDraft, ProviderStore};
