//! End-to-end behavior across adapters sharing one cache root:
//! deduplication of identical payloads and pruning of expired data.

use pixvault_cache::Pruner;
use pixvault_storages::{ResultStorage, SourceStorage, TtlDirectives};
use std::time::Duration;
use tempfile::TempDir;

fn blob_count(root: &std::path::Path) -> usize {
    let files = root.join("files");
    if !files.exists() {
        return 0;
    }
    walkdir::WalkDir::new(files)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}

#[test]
fn identical_payloads_share_one_blob_across_adapters() {
    let tmp = TempDir::new().unwrap();
    let results = ResultStorage::new(tmp.path(), false);
    let sources = SourceStorage::new(tmp.path());
    let ttl = TtlDirectives::new(Some(3600), None);

    let payload = b"identical image bytes";
    results
        .put("https://img.example.com/a.jpg", false, payload, &ttl)
        .unwrap();
    sources
        .put("https://origin.example.com/a.jpg", payload, &ttl)
        .unwrap();

    assert_eq!(blob_count(tmp.path()), 1);
    assert_eq!(
        results
            .get("https://img.example.com/a.jpg", false, false)
            .unwrap()
            .unwrap()
            .data,
        payload
    );
    assert_eq!(
        sources
            .get("https://origin.example.com/a.jpg", false)
            .unwrap()
            .unwrap(),
        payload
    );
}

#[test]
fn prune_reclaims_expired_entries_and_their_blobs() {
    let tmp = TempDir::new().unwrap();
    let results = ResultStorage::new(tmp.path(), false);
    let sources = SourceStorage::new(tmp.path());

    // One entry that never expires, one whose shared lifetime is minimal
    results
        .put(
            "https://img.example.com/keep.jpg",
            false,
            b"keep these bytes",
            &TtlDirectives::new(Some(86400), None),
        )
        .unwrap();
    sources
        .put(
            "https://origin.example.com/drop.jpg",
            b"drop these bytes",
            // shared lifetime dominates; max_age alone would forbid the write
            &TtlDirectives::new(Some(0), Some(1)),
        )
        .unwrap();
    assert_eq!(blob_count(tmp.path()), 2);

    std::thread::sleep(Duration::from_millis(1100));

    let stats = Pruner::new(tmp.path()).run().unwrap();
    assert_eq!(stats.entries_removed, 1);
    assert_eq!(stats.blobs_removed, 1);

    assert!(
        results
            .get("https://img.example.com/keep.jpg", false, false)
            .unwrap()
            .is_some()
    );
    assert!(
        sources
            .get("https://origin.example.com/drop.jpg", false)
            .unwrap()
            .is_none()
    );
    assert_eq!(blob_count(tmp.path()), 1);
}
