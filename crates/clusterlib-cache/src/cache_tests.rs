use super::*;

fn key(s: &str) -> NotifyableKey {
    NotifyableKey::new(s)
}

#[test]
fn get_or_create_is_idempotent() {
    let cache = NotifyableCache::new();
    let k = key("/clusterlib/1.0/root/applications/app1");
    let first = cache.get_or_create(NotifyableKind::Application, &k, "app1", None).unwrap();
    let second = cache.get_or_create(NotifyableKind::Application, &k, "app1", None).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn root_is_a_singleton_across_calls() {
    let cache = NotifyableCache::new();
    let k = key("/clusterlib/1.0/root");
    let first = cache.get_or_create_root(&k);
    let second = cache.get_or_create_root(&k);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn get_returns_none_for_unknown_key() {
    let cache = NotifyableCache::new();
    assert!(cache.get(NotifyableKind::Node, &key("/nope")).is_none());
}

fn build_app_group_node(cache: &NotifyableCache) -> (Arc<Notifyable>, Arc<Notifyable>, Arc<Notifyable>) {
    let app_key = key("/clusterlib/1.0/root/applications/app1");
    let app = cache.get_or_create(NotifyableKind::Application, &app_key, "app1", None).unwrap();

    let group_key = key("/clusterlib/1.0/root/applications/app1/groups/g");
    let group = cache
        .get_or_create(NotifyableKind::Group, &group_key, "g", Some(app_key.clone()))
        .unwrap();

    let node_key = key("/clusterlib/1.0/root/applications/app1/groups/g/nodes/n1");
    let node = cache
        .get_or_create(NotifyableKind::Node, &node_key, "n1", Some(group_key.clone()))
        .unwrap();

    (app, group, node)
}

#[test]
fn non_recursive_remove_fails_when_children_exist() {
    let cache = NotifyableCache::new();
    let (app, _group, _node) = build_app_group_node(&cache);
    let err = cache.remove(&app, false).unwrap_err();
    assert!(matches!(err, ClusterlibError::InvalidArguments(_)));
}

#[test]
fn recursive_remove_clears_every_cache_map_and_fills_the_graveyard() {
    let cache = NotifyableCache::new();
    let (app, group, node) = build_app_group_node(&cache);

    let removed = cache.remove(&app, true).unwrap();
    assert_eq!(removed.len(), 3);
    // Node (the leaf) must precede Group, which must precede Application.
    assert_eq!(removed[0].key, node.key);
    assert_eq!(removed[1].key, group.key);
    assert_eq!(removed[2].key, app.key);

    assert!(cache.get(NotifyableKind::Application, &app.key).is_none());
    assert!(cache.get(NotifyableKind::Group, &group.key).is_none());
    assert!(cache.get(NotifyableKind::Node, &node.key).is_none());
    assert_eq!(cache.graveyard_len(), 3);

    for handle in [&app, &group, &node] {
        assert!(handle.require_ready().is_err());
    }
}

#[test]
fn remove_of_childless_leaf_does_not_require_recursive() {
    let cache = NotifyableCache::new();
    let (_app, _group, node) = build_app_group_node(&cache);
    let removed = cache.remove(&node, false).unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(cache.graveyard_len(), 1);
}
