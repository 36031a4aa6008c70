use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clusterlib_core::ClusterlibConfig;
use clusterlib_repository::{InMemoryRepository, Repository};

use super::*;
use crate::factory::Factory;
use crate::notifyable_api::Root;

fn config() -> ClusterlibConfig {
    ClusterlibConfig::default()
        .with_synchronize_timeout(Duration::from_secs(2))
}

fn new_factory() -> Arc<Factory> {
    let repo: Arc<dyn clusterlib_repository::Repository> = Arc::new(InMemoryRepository::new());
    Factory::new(repo, config())
}

struct AlwaysHealthy;

#[async_trait::async_trait]
impl HealthCheck for AlwaysHealthy {
    async fn check(&self) -> HealthStatus {
        HealthStatus::healthy("ok")
    }
}

struct CountingHealthCheck(Arc<AtomicUsize>);

#[async_trait::async_trait]
impl HealthCheck for CountingHealthCheck {
    async fn check(&self) -> HealthStatus {
        self.0.fetch_add(1, Ordering::SeqCst);
        HealthStatus::healthy("ok")
    }
}

#[tokio::test]
async fn new_rejects_a_node_with_no_group_ancestor() {
    let factory = new_factory();
    let root = Root::new(factory.clone());
    let app = root.application("app1", true).await.unwrap().unwrap();
    let node = app.node("n1", true).await.unwrap().unwrap();

    let err = Server::new(node, factory.clone(), Arc::new(AlwaysHealthy)).unwrap_err();
    assert!(matches!(err, clusterlib_core::ClusterlibError::InvalidMethod(_)));
    factory.shutdown().await;
}

#[tokio::test]
async fn try_to_become_leader_then_give_up_leadership_round_trips() {
    let factory = new_factory();
    let root = Root::new(factory.clone());
    let app = root.application("app1", true).await.unwrap().unwrap();
    let group = app.group("g1", true).await.unwrap().unwrap();
    let node = group.node("n1", true).await.unwrap().unwrap();

    let server = Server::new(node, factory.clone(), Arc::new(AlwaysHealthy)).unwrap();
    assert!(!server.am_i_the_leader().await);
    server.try_to_become_leader().await.unwrap();
    assert!(server.am_i_the_leader().await);
    server.give_up_leadership().await.unwrap();
    assert!(!server.am_i_the_leader().await);
    factory.shutdown().await;
}

#[tokio::test]
async fn health_checker_ticks_and_publishes_client_state() {
    let factory = new_factory();
    let root = Root::new(factory.clone());
    let app = root.application("app1", true).await.unwrap().unwrap();
    let group = app.group("g1", true).await.unwrap().unwrap();
    let node = group.node("n1", true).await.unwrap().unwrap();
    let node_key = node.key().clone();

    let ticks = Arc::new(AtomicUsize::new(0));
    let server = Server::new(node, factory.clone(), Arc::new(CountingHealthCheck(ticks.clone()))).unwrap();
    server.start_health_checker().await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    server.stop_health_checker().await;
    assert!(ticks.load(Ordering::SeqCst) >= 1);

    let (data, _) = factory.repo().get_node_data(&format!("{node_key}/clientState"), None).await.unwrap();
    assert_eq!(data, b"healthy:ok");
    factory.shutdown().await;
}
