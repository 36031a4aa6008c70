use clusterlib_repository::InMemoryRepository;

use super::*;

fn key() -> NotifyableKey {
    NotifyableKey::new("/clusterlib/1.0/root/applications/app1/nodes/n1/processSlots/s1")
}

#[tokio::test]
async fn new_slot_starts_unused_with_no_pid() {
    let slot = ProcessSlot::new(key());
    assert_eq!(slot.state(), CurrentProcessState::Unused);
    assert_eq!(slot.pid(), None);
    assert!(slot.exec_args().is_empty());
}

#[tokio::test]
async fn publish_then_refresh_on_another_handle_roundtrips_fields() {
    let repo = InMemoryRepository::new();
    let mut writer = ProcessSlot::new(key());
    writer.set_state(CurrentProcessState::Running);
    writer.set_exec_args(vec!["bin/worker".to_string(), "--flag".to_string()]);
    writer.set_ports(vec![8080, 9090]);
    writer.set_pid(Some(4242));
    writer.set_reservation_name(Some("slot-a".to_string()));
    writer.publish(&repo).await.unwrap();

    let mut reader = ProcessSlot::new(key());
    reader.refresh(&repo).await.unwrap();
    assert_eq!(reader.state(), CurrentProcessState::Running);
    assert_eq!(reader.exec_args(), ["bin/worker", "--flag"]);
    assert_eq!(reader.ports(), [8080, 9090]);
    assert_eq!(reader.pid(), Some(4242));
    assert_eq!(reader.reservation_name(), Some("slot-a"));
}

#[tokio::test]
async fn unknown_state_word_decodes_as_invalid() {
    let repo = InMemoryRepository::new();
    let path = format!("{}/keyVal", key());
    repo.create_node(&path, b"state=garbage;", clusterlib_repository::CreateFlags::NONE).await.unwrap();

    let mut slot = ProcessSlot::new(key());
    slot.refresh(&repo).await.unwrap();
    assert_eq!(slot.state(), CurrentProcessState::Invalid);
}

#[tokio::test]
async fn stale_publish_after_concurrent_write_conflicts() {
    let repo = InMemoryRepository::new();
    let mut first = ProcessSlot::new(key());
    first.set_state(CurrentProcessState::Started);
    first.publish(&repo).await.unwrap();

    let mut second = ProcessSlot::new(key());
    second.refresh(&repo).await.unwrap();
    second.set_state(CurrentProcessState::Running);
    second.publish(&repo).await.unwrap();

    first.set_state(CurrentProcessState::Failed);
    let err = first.publish(&repo).await.unwrap_err();
    assert!(matches!(err, PropertyListError::Conflict { .. }));
}
