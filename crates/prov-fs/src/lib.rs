//! Filesystem layer for Provider Manager
//!
//! Provides the low-level primitives the backup engine is built on: canonical
//! SHA-256 checksums over files and directory trees, atomic writes with
//! advisory locking, sequential recursive copies, and owner-only permission
//! handling.

pub mod checksum;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::{TreeDigest, compute_content_checksum, compute_file_checksum, hash_tree};
pub use error::{Error, Result};
pub use io::{CopyStats, copy_dir_recursive, remove_dir_if_exists, restrict_permissions, write_atomic};
pub use path::validate_identifier;
