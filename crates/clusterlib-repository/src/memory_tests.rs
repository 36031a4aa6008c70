use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::traits::CreateFlags;

fn flag_watch(flag: Arc<AtomicBool>) -> WatchCallback {
    Arc::new(move |_event| {
        flag.store(true, Ordering::SeqCst);
    })
}

#[tokio::test]
async fn create_then_get_roundtrips_data_and_version() {
    let repo = InMemoryRepository::new();
    let path = repo.create_node("/app1", b"hello", CreateFlags::NONE).await.unwrap();
    assert_eq!(path, "/app1");

    let (data, stat) = repo.get_node_data("/app1", None).await.unwrap();
    assert_eq!(data, b"hello");
    assert_eq!(stat.version, 0);
}

#[tokio::test]
async fn create_node_rejects_duplicate_path() {
    let repo = InMemoryRepository::new();
    repo.create_node("/app1", b"", CreateFlags::NONE).await.unwrap();
    let err = repo.create_node("/app1", b"", CreateFlags::NONE).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NodeExists(_)));
}

#[tokio::test]
async fn sequential_create_appends_monotonic_suffixes() {
    let repo = InMemoryRepository::new();
    let first = repo.create_node("/locks/bid_", b"", CreateFlags::SEQUENCE).await.unwrap();
    let second = repo.create_node("/locks/bid_", b"", CreateFlags::SEQUENCE).await.unwrap();
    assert_eq!(first, "/locks/bid_0000000000");
    assert_eq!(second, "/locks/bid_0000000001");
}

#[tokio::test]
async fn set_node_data_enforces_cas_version() {
    let repo = InMemoryRepository::new();
    repo.create_node("/app1", b"v0", CreateFlags::NONE).await.unwrap();

    let err = repo.set_node_data("/app1", b"v1", 7).await.unwrap_err();
    assert!(matches!(err, RepositoryError::BadVersion { expected: 7, found: 0, .. }));

    let stat = repo.set_node_data("/app1", b"v1", 0).await.unwrap();
    assert_eq!(stat.version, 1);
    let (data, _) = repo.get_node_data("/app1", None).await.unwrap();
    assert_eq!(data, b"v1");
}

#[tokio::test]
async fn delete_node_requires_recursive_flag_for_nonempty() {
    let repo = InMemoryRepository::new();
    repo.create_node("/app1", b"", CreateFlags::NONE).await.unwrap();
    repo.create_node("/app1/child", b"", CreateFlags::NONE).await.unwrap();

    let err = repo.delete_node("/app1", false, None).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotEmpty(_)));

    let removed = repo.delete_node("/app1", true, None).await.unwrap();
    assert!(removed);
    assert!(!repo.exists("/app1", None).await.unwrap());
    assert!(!repo.exists("/app1/child", None).await.unwrap());
}

#[tokio::test]
async fn delete_missing_node_returns_false() {
    let repo = InMemoryRepository::new();
    let removed = repo.delete_node("/nope", false, None).await.unwrap();
    assert!(!removed);
}

#[tokio::test]
async fn get_node_children_lists_only_direct_children() {
    let repo = InMemoryRepository::new();
    repo.create_node("/app1", b"", CreateFlags::NONE).await.unwrap();
    repo.create_node("/app1/a", b"", CreateFlags::NONE).await.unwrap();
    repo.create_node("/app1/b", b"", CreateFlags::NONE).await.unwrap();
    repo.create_node("/app1/a/grandchild", b"", CreateFlags::NONE).await.unwrap();

    let mut children = repo.get_node_children("/app1", None).await.unwrap();
    children.sort();
    assert_eq!(children, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn exists_watch_fires_once_on_later_creation() {
    let repo = InMemoryRepository::new();
    let fired = Arc::new(AtomicBool::new(false));
    let watch = flag_watch(fired.clone());

    assert!(!repo.exists("/app1", Some(watch)).await.unwrap());
    assert!(!fired.load(Ordering::SeqCst));

    repo.create_node("/app1", b"", CreateFlags::NONE).await.unwrap();
    assert!(fired.load(Ordering::SeqCst));
}

#[tokio::test]
async fn data_watch_is_one_shot() {
    let repo = InMemoryRepository::new();
    repo.create_node("/app1", b"v0", CreateFlags::NONE).await.unwrap();

    let fire_count = Arc::new(AtomicUsize::new(0));
    let counter = fire_count.clone();
    let watch: WatchCallback = Arc::new(move |_event| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    repo.get_node_data("/app1", Some(watch)).await.unwrap();

    repo.set_node_data("/app1", b"v1", 0).await.unwrap();
    repo.set_node_data("/app1", b"v2", 1).await.unwrap();

    assert_eq!(fire_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn child_watch_fires_on_child_creation_and_deletion() {
    let repo = InMemoryRepository::new();
    repo.create_node("/app1", b"", CreateFlags::NONE).await.unwrap();

    let fired = Arc::new(AtomicBool::new(false));
    repo.get_node_children("/app1", Some(flag_watch(fired.clone()))).await.unwrap();
    repo.create_node("/app1/child", b"", CreateFlags::NONE).await.unwrap();
    assert!(fired.load(Ordering::SeqCst));

    let fired_again = Arc::new(AtomicBool::new(false));
    repo.get_node_children("/app1", Some(flag_watch(fired_again.clone()))).await.unwrap();
    repo.delete_node("/app1/child", false, None).await.unwrap();
    assert!(fired_again.load(Ordering::SeqCst));
}

#[tokio::test]
async fn sync_invokes_watch_after_yielding() {
    let repo = InMemoryRepository::new();
    let fired = Arc::new(AtomicBool::new(false));
    repo.sync("/app1", flag_watch(fired.clone())).await.unwrap();
    assert!(fired.load(Ordering::SeqCst));
}
