use std::sync::Arc;
use std::time::Duration;

use clusterlib_repository::InMemoryRepository;

use super::*;

fn group_key() -> NotifyableKey {
    NotifyableKey::new("/clusterlib/1.0/root/applications/app1/groups/g1")
}

#[tokio::test]
async fn sole_bidder_becomes_leader_and_publishes_current_leader() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let election = LeaderElection::new(repo.clone());
    let group = group_key();

    let (status, bid_path) = election.bid(&group).await.unwrap();
    assert_eq!(status, LeadershipStatus::Leader);
    assert!(bid_path.starts_with(group.leader_bid_dir_key().as_str()));

    let (data, _) = repo.get_node_data(group.current_leader_key().as_str(), None).await.unwrap();
    assert!(!data.is_empty());
}

#[tokio::test]
async fn second_bidder_waits_until_the_leader_abdicates() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let first = Arc::new(LeaderElection::new(repo.clone()));
    let second = Arc::new(LeaderElection::new(repo));
    let group = group_key();

    let (first_status, first_bid_path) = first.bid(&group).await.unwrap();
    assert_eq!(first_status, LeadershipStatus::Leader);

    let second_clone = second.clone();
    let group_clone = group.clone();
    let waiter = tokio::spawn(async move { second_clone.bid(&group_clone).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    first.abdicate(&group, &first_bid_path).await.unwrap();
    let (status, _second_bid_path) = waiter.await.unwrap().unwrap();
    assert_eq!(status, LeadershipStatus::Leader);
}

#[tokio::test]
async fn drive_on_preceding_leader_exists_wakes_every_outstanding_watch() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let election = LeaderElection::new(repo);

    let queue = Arc::new(BlockingQueue::new());
    election.watches.lock().insert("/some/bid".to_string(), queue.clone());

    election.drive_on_preceding_leader_exists().unwrap();
    assert!(!queue.is_empty());
}

#[tokio::test]
async fn signal_for_unregistered_bid_is_inconsistent_state() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let election = LeaderElection::new(repo);
    let err = election.signal("/nope").unwrap_err();
    assert!(matches!(err, ClusterlibError::InconsistentInternalState { .. }));
}
