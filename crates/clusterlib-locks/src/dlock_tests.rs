use std::sync::Arc;
use std::time::Duration;

use clusterlib_repository::InMemoryRepository;

use super::*;

fn target() -> NotifyableKey {
    NotifyableKey::new("/clusterlib/1.0/root/applications/app1/nodes/n1")
}

#[tokio::test]
async fn acquire_then_release_leaves_the_lock_directory_empty() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let locks = DistributedLocks::new(repo.clone());
    let key = target();

    locks.acquire(&key).await.unwrap();
    assert_eq!(locks.held_refcount(&key), 1);

    locks.release(&key).await.unwrap();
    assert_eq!(locks.held_refcount(&key), 0);

    let children = repo.get_node_children(key.lock_dir_key().as_str(), None).await.unwrap();
    assert!(children.is_empty());
}

#[tokio::test]
async fn acquire_is_reentrant_via_refcount() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let locks = DistributedLocks::new(repo);
    let key = target();

    locks.acquire(&key).await.unwrap();
    locks.acquire(&key).await.unwrap();
    assert_eq!(locks.held_refcount(&key), 2);

    locks.release(&key).await.unwrap();
    assert_eq!(locks.held_refcount(&key), 1);
    locks.release(&key).await.unwrap();
    assert_eq!(locks.held_refcount(&key), 0);
}

#[tokio::test]
async fn release_without_acquire_is_invalid_method() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let locks = DistributedLocks::new(repo);
    let err = locks.release(&target()).await.unwrap_err();
    assert!(matches!(err, ClusterlibError::InvalidMethod(_)));
}

#[tokio::test]
async fn second_bidder_waits_until_the_first_releases() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let first = Arc::new(DistributedLocks::new(repo.clone()));
    let second = Arc::new(DistributedLocks::new(repo));
    let key = target();

    first.acquire(&key).await.unwrap();

    let second_clone = second.clone();
    let key_clone = key.clone();
    let waiter = tokio::spawn(async move { second_clone.acquire(&key_clone).await });

    // Give the second bidder time to register its bid and start waiting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    first.release(&key).await.unwrap();
    waiter.await.unwrap().unwrap();
    assert_eq!(second.held_refcount(&key), 1);
}

#[tokio::test]
async fn signal_for_unregistered_bid_is_inconsistent_state() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let locks = DistributedLocks::new(repo);
    let err = locks.signal_preceding_lock_node_exists("/nope").unwrap_err();
    assert!(matches!(err, ClusterlibError::InconsistentInternalState { .. }));
}
