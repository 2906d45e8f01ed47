//! Tests for Index
//!
//! These tests verify:
//! - Loading an empty or existing index
//! - Expiration queries (NoData, NeverExpires, Live, Expired)
//! - Upserts and idempotent removal
//! - Live entry listing
//! - Rollback when persisting fails
//! - Corrupt index detection

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tempfile::TempDir;
use traystore::index::{ExpiryStatus, Index, INDEX_KEY};
use traystore::TrayError;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn past() -> SystemTime {
    SystemTime::now() - Duration::from_secs(1)
}

fn future() -> SystemTime {
    SystemTime::now() + Duration::from_secs(3600)
}

// =============================================================================
// Load Tests
// =============================================================================

#[test]
fn test_load_empty_directory() {
    let (_temp, path) = setup_temp_dir();

    let index = Index::load(&path).unwrap();

    assert!(index.is_empty());
    assert!(!path.join(INDEX_KEY).exists());
}

#[test]
fn test_load_persisted_entries() {
    let (_temp, path) = setup_temp_dir();

    {
        let index = Index::load(&path).unwrap();
        index.record_write("forever", None).unwrap();
        index.record_write("later", Some(future())).unwrap();
    }

    let index = Index::load(&path).unwrap();

    assert_eq!(index.len(), 2);
    assert_eq!(index.is_expired("forever").unwrap(), ExpiryStatus::NeverExpires);
    assert_eq!(index.is_expired("later").unwrap(), ExpiryStatus::Live);
}

#[test]
fn test_load_corrupt_index_fails() {
    let (_temp, path) = setup_temp_dir();
    fs::write(path.join(INDEX_KEY), [1u8, 2, 3]).unwrap();

    let result = Index::load(&path);

    assert!(matches!(result, Err(TrayError::Corrupt(_))));
}

// =============================================================================
// Expiration Tests
// =============================================================================

#[test]
fn test_is_expired_unknown_key() {
    let (_temp, path) = setup_temp_dir();
    let index = Index::load(&path).unwrap();

    let result = index.is_expired("missing");

    assert!(matches!(result, Err(TrayError::NoData)));
}

#[test]
fn test_is_expired_states() {
    let (_temp, path) = setup_temp_dir();
    let index = Index::load(&path).unwrap();

    index.record_write("never", None).unwrap();
    index.record_write("live", Some(future())).unwrap();
    index.record_write("dead", Some(past())).unwrap();

    assert_eq!(index.is_expired("never").unwrap(), ExpiryStatus::NeverExpires);
    assert_eq!(index.is_expired("live").unwrap(), ExpiryStatus::Live);
    assert_eq!(index.is_expired("dead").unwrap(), ExpiryStatus::Expired);
}

// =============================================================================
// Write / Remove Tests
// =============================================================================

#[test]
fn test_record_write_updates_existing_entry() {
    let (_temp, path) = setup_temp_dir();
    let index = Index::load(&path).unwrap();

    index.record_write("key", Some(past())).unwrap();
    let first = index.entry("key").unwrap();

    index.record_write("key", None).unwrap();
    let second = index.entry("key").unwrap();

    assert_eq!(index.len(), 1);
    assert_eq!(second.expired_at, None);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(index.is_expired("key").unwrap(), ExpiryStatus::NeverExpires);
}

#[test]
fn test_record_write_persists_immediately() {
    let (_temp, path) = setup_temp_dir();
    let index = Index::load(&path).unwrap();

    index.record_write("key", None).unwrap();

    assert!(path.join(INDEX_KEY).exists());
    let reloaded = Index::load(&path).unwrap();
    assert!(reloaded.entry("key").is_some());
}

#[test]
fn test_remove_entry() {
    let (_temp, path) = setup_temp_dir();
    let index = Index::load(&path).unwrap();
    index.record_write("key", None).unwrap();

    index.remove("key").unwrap();

    assert!(index.entry("key").is_none());
    let reloaded = Index::load(&path).unwrap();
    assert!(reloaded.is_empty());
}

#[test]
fn test_remove_missing_is_idempotent() {
    let (_temp, path) = setup_temp_dir();
    let index = Index::load(&path).unwrap();

    index.remove("missing").unwrap();
    index.remove("missing").unwrap();

    assert!(index.is_empty());
}

// =============================================================================
// Live Entry Tests
// =============================================================================

#[test]
fn test_live_entries_excludes_expired() {
    let (_temp, path) = setup_temp_dir();
    let index = Index::load(&path).unwrap();

    index.record_write("never", None).unwrap();
    index.record_write("live", Some(future())).unwrap();
    index.record_write("dead", Some(past())).unwrap();

    let mut keys: Vec<String> = index.live_entries().into_iter().map(|e| e.key).collect();
    keys.sort();

    assert_eq!(keys, vec!["live".to_string(), "never".to_string()]);
    assert!(keys.iter().all(|k| k != INDEX_KEY));
}

#[test]
fn test_expired_entries() {
    let (_temp, path) = setup_temp_dir();
    let index = Index::load(&path).unwrap();

    index.record_write("never", None).unwrap();
    index.record_write("dead", Some(past())).unwrap();

    let expired = index.expired_entries();

    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].key, "dead");
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_pre_epoch_expiration_is_clamped() {
    let (_temp, path) = setup_temp_dir();
    let index = Index::load(&path).unwrap();

    index.record_write("old", Some(UNIX_EPOCH - Duration::from_secs(1))).unwrap();

    assert_eq!(index.entry("old").unwrap().expired_at, Some(UNIX_EPOCH));
    assert_eq!(index.is_expired("old").unwrap(), ExpiryStatus::Expired);

    // Later writes still persist
    index.record_write("fresh", None).unwrap();
    let reloaded = Index::load(&path).unwrap();
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn test_failed_persist_rolls_back() {
    let (_temp, path) = setup_temp_dir();
    let index = Index::load(&path).unwrap();
    index.record_write("a", Some(future())).unwrap();
    let before = index.entry("a").unwrap();

    // A directory in place of the index file makes every persist fail
    fs::remove_file(path.join(INDEX_KEY)).unwrap();
    fs::create_dir(path.join(INDEX_KEY)).unwrap();

    assert!(matches!(index.record_write("b", None), Err(TrayError::Io(_))));
    assert!(index.entry("b").is_none());

    assert!(matches!(index.record_write("a", None), Err(TrayError::Io(_))));
    assert_eq!(index.entry("a").unwrap(), before);

    assert!(matches!(index.remove("a"), Err(TrayError::Io(_))));
    assert_eq!(index.entry("a").unwrap(), before);

    // Once the file is writable again, the map persists as it was
    fs::remove_dir(path.join(INDEX_KEY)).unwrap();
    index.record_write("c", None).unwrap();

    let mut keys: Vec<String> = Index::load(&path)
        .unwrap()
        .live_entries()
        .into_iter()
        .map(|e| e.key)
        .collect();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
}
