use clusterlib_repository::InMemoryRepository;

use super::*;

fn key() -> NotifyableKey {
    NotifyableKey::new("/clusterlib/1.0/root/applications/app1/queues/q1")
}

#[tokio::test]
async fn take_on_an_empty_queue_returns_none() {
    let repo = InMemoryRepository::new();
    let queue = Queue::new(key());
    assert_eq!(queue.take(&repo).await.unwrap(), None);
}

#[tokio::test]
async fn put_then_take_returns_elements_in_fifo_order() {
    let repo = InMemoryRepository::new();
    let queue = Queue::new(key());
    queue.put(&repo, b"first").await.unwrap();
    queue.put(&repo, b"second").await.unwrap();
    queue.put(&repo, b"third").await.unwrap();

    assert_eq!(queue.take(&repo).await.unwrap(), Some(b"first".to_vec()));
    assert_eq!(queue.take(&repo).await.unwrap(), Some(b"second".to_vec()));
    assert_eq!(queue.take(&repo).await.unwrap(), Some(b"third".to_vec()));
    assert_eq!(queue.take(&repo).await.unwrap(), None);
}

#[tokio::test]
async fn size_reflects_outstanding_elements() {
    let repo = InMemoryRepository::new();
    let queue = Queue::new(key());
    assert_eq!(queue.size(&repo).await.unwrap(), 0);
    queue.put(&repo, b"a").await.unwrap();
    queue.put(&repo, b"b").await.unwrap();
    assert_eq!(queue.size(&repo).await.unwrap(), 2);
    queue.take(&repo).await.unwrap();
    assert_eq!(queue.size(&repo).await.unwrap(), 1);
}
