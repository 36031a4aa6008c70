use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use clusterlib_cache::HandlerTable;
use clusterlib_core::key::compose_app_key;
use clusterlib_repository::{CreateFlags, InMemoryRepository};

use super::*;
use crate::client::{Client, ClientPayload, UserEventHandler};

#[tokio::test]
async fn external_dispatch_fans_an_attribute_change_out_to_every_client() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let cache = Arc::new(NotifyableCache::new());
    let handlers = Arc::new(HandlerTable::with_default_attribute_handlers());
    let clients = Arc::new(Mutex::new(Vec::new()));

    let app_key = compose_app_key("app1");
    cache.get_or_create(clusterlib_core::NotifyableKind::Application, &app_key, "app1", None).unwrap();
    repo.create_node(app_key.as_str(), &[], CreateFlags::NONE).await.unwrap();
    repo.create_node(&format!("{app_key}/applications"), b"v1", CreateFlags::NONE).await.unwrap();

    let (client, _task) = Client::spawn(1);
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = Arc::clone(&hits);
    let handler: UserEventHandler = Arc::new(move |_k, _e| {
        hits_clone.fetch_add(1, Ordering::SeqCst);
    });
    client.register_handler(app_key.clone(), handler);
    clients.lock().push(Arc::clone(&client));

    let dispatcher = Dispatcher::new();
    dispatcher.spawn_external(Arc::clone(&repo), Arc::clone(&cache), Arc::clone(&handlers), Arc::clone(&clients));

    dispatcher.deposit(RepositoryPayload {
        kind: HandlerKind::Applications,
        key: app_key.clone(),
        backend_event: CacheBackendEventType::Changed,
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    dispatcher.request_shutdown();
}

#[tokio::test]
async fn shutdown_dispatches_exactly_one_end_event_per_client() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let cache = Arc::new(NotifyableCache::new());
    let handlers = Arc::new(HandlerTable::with_default_attribute_handlers());
    let clients = Arc::new(Mutex::new(Vec::new()));

    let (client, task) = Client::spawn(1);
    clients.lock().push(Arc::clone(&client));

    let dispatcher = Dispatcher::new();
    let external = dispatcher.spawn_external(repo, cache, handlers, clients);

    dispatcher.request_shutdown();
    tokio::time::timeout(Duration::from_secs(2), external).await.unwrap().unwrap();
    tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn locks_path_events_are_not_fanned_out_externally() {
    assert!(is_internal(&NotifyableKey::new("/clusterlib/1.0/root/applications/app1/locks/bid_0000000000")));
    assert!(!is_internal(&NotifyableKey::new("/clusterlib/1.0/root/applications/app1")));
}
