// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `InMemoryRepository`: an in-process fake implementing [`Repository`],
//! sufficient to drive distributed locks, leader election, and the full
//! dispatch pipeline in tests without a real coordination-service backend.
//!
//! Grounded on the teacher's `test-support`/`FakeAdapter` pattern
//! (`oj-adapters`) — a first-class in-tree fake rather than a mock
//! framework, kept behind the same trait as the (unshipped) real backend.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::RepositoryError;
use crate::traits::{
    CreateFlags, NodeStat, Repository, RepositoryEvent, RepositoryEventKind, WatchCallback,
};

struct NodeEntry {
    data: Vec<u8>,
    version: i64,
    #[allow(dead_code)] // tracked for fidelity; the fake never expires sessions
    ephemeral: bool,
}

#[derive(Default)]
struct Tree {
    nodes: HashMap<String, NodeEntry>,
    sequence_counters: HashMap<String, u64>,
    data_watches: HashMap<String, Vec<WatchCallback>>,
    children_watches: HashMap<String, Vec<WatchCallback>>,
}

impl Tree {
    fn fire_data(&mut self, path: &str, kind: RepositoryEventKind) {
        if let Some(watches) = self.data_watches.remove(path) {
            for watch in watches {
                watch(RepositoryEvent { kind, path: path.to_string(), session_state: None });
            }
        }
    }

    fn fire_children(&mut self, path: &str, kind: RepositoryEventKind) {
        if let Some(watches) = self.children_watches.remove(path) {
            for watch in watches {
                watch(RepositoryEvent { kind, path: path.to_string(), session_state: None });
            }
        }
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "",
        Some(idx) => &path[..idx],
    }
}

/// In-memory fake [`Repository`]. `Clone` is cheap (shares the underlying
/// tree via an `Arc`-like `Mutex` wrapper held by the caller).
#[derive(Default)]
pub struct InMemoryRepository {
    tree: Mutex<Tree>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_node(
        &self,
        path: &str,
        data: &[u8],
        flags: CreateFlags,
    ) -> Result<String, RepositoryError> {
        let mut tree = self.tree.lock();
        let full_path = if flags.sequence {
            let counter = tree.sequence_counters.entry(path.to_string()).or_insert(0);
            let seq = *counter;
            *counter += 1;
            format!("{path}{seq:010}")
        } else {
            path.to_string()
        };

        if tree.nodes.contains_key(&full_path) {
            return Err(RepositoryError::NodeExists(full_path));
        }
        tree.nodes.insert(
            full_path.clone(),
            NodeEntry { data: data.to_vec(), version: 0, ephemeral: flags.ephemeral },
        );

        tree.fire_data(&full_path, RepositoryEventKind::Created);
        let parent = parent_of(&full_path).to_string();
        tree.fire_children(&parent, RepositoryEventKind::Child);

        Ok(full_path)
    }

    async fn delete_node(
        &self,
        path: &str,
        recursive: bool,
        version: Option<i64>,
    ) -> Result<bool, RepositoryError> {
        let mut tree = self.tree.lock();
        let Some(entry) = tree.nodes.get(path) else {
            return Ok(false);
        };
        if let Some(expected) = version {
            if entry.version != expected {
                return Err(RepositoryError::BadVersion {
                    path: path.to_string(),
                    expected,
                    found: entry.version,
                });
            }
        }

        let child_prefix = format!("{path}/");
        let children: Vec<String> =
            tree.nodes.keys().filter(|k| k.starts_with(&child_prefix)).cloned().collect();
        if !children.is_empty() && !recursive {
            return Err(RepositoryError::NotEmpty(path.to_string()));
        }
        for child in &children {
            tree.nodes.remove(child);
            tree.fire_data(child, RepositoryEventKind::Deleted);
        }
        tree.nodes.remove(path);
        tree.fire_data(path, RepositoryEventKind::Deleted);
        tree.fire_children(path, RepositoryEventKind::Deleted);
        let parent = parent_of(path).to_string();
        tree.fire_children(&parent, RepositoryEventKind::Child);

        Ok(true)
    }

    async fn exists(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> Result<bool, RepositoryError> {
        let mut tree = self.tree.lock();
        if let Some(watch) = watch {
            tree.data_watches.entry(path.to_string()).or_default().push(watch);
        }
        Ok(tree.nodes.contains_key(path))
    }

    async fn get_node_data(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> Result<(Vec<u8>, NodeStat), RepositoryError> {
        let mut tree = self.tree.lock();
        let entry =
            tree.nodes.get(path).map(|e| (e.data.clone(), e.version)).ok_or_else(|| {
                RepositoryError::NoNode(path.to_string())
            })?;
        if let Some(watch) = watch {
            tree.data_watches.entry(path.to_string()).or_default().push(watch);
        }
        Ok((entry.0, NodeStat { version: entry.1 }))
    }

    async fn set_node_data(
        &self,
        path: &str,
        data: &[u8],
        version: i64,
    ) -> Result<NodeStat, RepositoryError> {
        let mut tree = self.tree.lock();
        let new_version = {
            let entry = tree
                .nodes
                .get_mut(path)
                .ok_or_else(|| RepositoryError::NoNode(path.to_string()))?;
            if entry.version != version {
                return Err(RepositoryError::BadVersion {
                    path: path.to_string(),
                    expected: version,
                    found: entry.version,
                });
            }
            entry.data = data.to_vec();
            entry.version += 1;
            entry.version
        };
        tree.fire_data(path, RepositoryEventKind::Changed);
        Ok(NodeStat { version: new_version })
    }

    async fn get_node_children(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> Result<Vec<String>, RepositoryError> {
        let mut tree = self.tree.lock();
        let prefix = format!("{path}/");
        let mut names: BTreeMap<String, ()> = BTreeMap::new();
        for key in tree.nodes.keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                if !rest.contains('/') {
                    names.insert(rest.to_string(), ());
                }
            }
        }
        if let Some(watch) = watch {
            tree.children_watches.entry(path.to_string()).or_default().push(watch);
        }
        Ok(names.into_keys().collect())
    }

    async fn sync(&self, path: &str, watch: WatchCallback) -> Result<(), RepositoryError> {
        // No real network round-trip to await; yield once so callers that
        // treat this as async I/O still observe cooperative scheduling.
        tokio::task::yield_now().await;
        watch(RepositoryEvent {
            kind: RepositoryEventKind::Changed,
            path: path.to_string(),
            session_state: None,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
