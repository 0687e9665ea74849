//! Integration tests combining copy, checksum, and atomic write

use assert_fs::prelude::*;
use predicates::prelude::*;

use prov_fs::{copy_dir_recursive, hash_tree, write_atomic};

#[test]
fn copied_tree_hashes_identically() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("src/settings.json").write_str(r#"{"a":1}"#).unwrap();
    temp.child("src/nested/notes.md").write_str("# notes").unwrap();

    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    let stats = copy_dir_recursive(&src, &dst).unwrap();
    assert_eq!(stats.files, 2);

    temp.child("dst/settings.json").assert(predicate::path::exists());
    temp.child("dst/nested/notes.md").assert("# notes");

    // Same relative layout and contents means same digest
    let src_digest = hash_tree(&src, &[]).unwrap();
    let dst_digest = hash_tree(&dst, &[]).unwrap();
    assert_eq!(src_digest, dst_digest);
}

#[test]
fn atomic_write_then_hash_round_trips() {
    let temp = assert_fs::TempDir::new().unwrap();
    let root = temp.path().join("tree");

    write_atomic(&root.join("a.txt"), b"alpha").unwrap();
    let before = hash_tree(&root, &[]).unwrap();

    // Overwriting with identical bytes keeps the digest stable
    write_atomic(&root.join("a.txt"), b"alpha").unwrap();
    let unchanged = hash_tree(&root, &[]).unwrap();
    assert_eq!(before, unchanged);

    // Any content change is visible
    write_atomic(&root.join("a.txt"), b"beta").unwrap();
    let changed = hash_tree(&root, &[]).unwrap();
    assert_ne!(before.checksum, changed.checksum);

    temp.child("tree/a.txt").assert("beta");
}
