use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

fn key(name: &str) -> NotifyableKey {
    NotifyableKey::new(format!("/clusterlib/1.0/root/applications/{name}"))
}

#[tokio::test]
async fn registered_handler_fires_only_for_its_key() {
    let (client, _task) = Client::spawn(1);
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();
    let handler: UserEventHandler = Arc::new(move |_k, _e| {
        hits_clone.fetch_add(1, Ordering::SeqCst);
    });
    client.register_handler(key("app1"), handler);

    client.deliver(ClientPayload::Semantic { key: key("app2"), event: SemanticEvent::ApplicationsChange });
    client.deliver(ClientPayload::Semantic { key: key("app1"), event: SemanticEvent::ApplicationsChange });
    client.deliver(ClientPayload::End);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancel_handler_removes_the_registration() {
    let (client, _task) = Client::spawn(2);
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();
    let handler: UserEventHandler = Arc::new(move |_k, _e| {
        hits_clone.fetch_add(1, Ordering::SeqCst);
    });
    client.register_handler(key("app1"), handler.clone());
    client.cancel_handler(&key("app1"), &handler);

    client.deliver(ClientPayload::Semantic { key: key("app1"), event: SemanticEvent::ApplicationsChange });
    client.deliver(ClientPayload::End);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn delivery_task_exits_after_end_event() {
    let (client, task) = Client::spawn(3);
    client.deliver(ClientPayload::End);
    tokio::time::timeout(std::time::Duration::from_millis(200), task).await.unwrap().unwrap();
}
