// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seven typed Notifyable caches plus the Root singleton, each behind its
//! own mutex (spec §5: "each typed cache map is guarded by its own
//! mutex" — so a lookup in `nodes` never blocks on `groups` traffic), and
//! an append-only graveyard for REMOVED objects (spec §3, §4.8).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use clusterlib_core::{ClusterlibError, ClusterlibResult, NotifyableKey, NotifyableKind};

use crate::notifyable::Notifyable;

type TypedMap = Mutex<HashMap<NotifyableKey, Arc<Notifyable>>>;

pub struct NotifyableCache {
    root: Mutex<Option<Arc<Notifyable>>>,
    applications: TypedMap,
    groups: TypedMap,
    nodes: TypedMap,
    distributions: TypedMap,
    property_lists: TypedMap,
    queues: TypedMap,
    process_slots: TypedMap,
    graveyard: Mutex<Vec<Arc<Notifyable>>>,
}

impl Default for NotifyableCache {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyableCache {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(None),
            applications: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            nodes: Mutex::new(HashMap::new()),
            distributions: Mutex::new(HashMap::new()),
            property_lists: Mutex::new(HashMap::new()),
            queues: Mutex::new(HashMap::new()),
            process_slots: Mutex::new(HashMap::new()),
            graveyard: Mutex::new(Vec::new()),
        }
    }

    fn map_for(&self, kind: NotifyableKind) -> Option<&TypedMap> {
        match kind {
            NotifyableKind::Root => None,
            NotifyableKind::Application => Some(&self.applications),
            NotifyableKind::Group => Some(&self.groups),
            NotifyableKind::Node => Some(&self.nodes),
            NotifyableKind::DataDistribution => Some(&self.distributions),
            NotifyableKind::PropertyList => Some(&self.property_lists),
            NotifyableKind::Queue => Some(&self.queues),
            NotifyableKind::ProcessSlot => Some(&self.process_slots),
        }
    }

    pub fn root(&self) -> Option<Arc<Notifyable>> {
        self.root.lock().clone()
    }

    pub fn get_or_create_root(&self, key: &NotifyableKey) -> Arc<Notifyable> {
        let mut guard = self.root.lock();
        if let Some(existing) = guard.as_ref() {
            return existing.clone();
        }
        let created = Notifyable::new(key.clone(), "root".to_string(), None, NotifyableKind::Root);
        *guard = Some(created.clone());
        created
    }

    pub fn get(&self, kind: NotifyableKind, key: &NotifyableKey) -> Option<Arc<Notifyable>> {
        if kind == NotifyableKind::Root {
            return self.root();
        }
        self.map_for(kind)?.lock().get(key).cloned()
    }

    /// Consult the typed map first; on miss, construct and insert under
    /// the same lock so two racing callers can never both create the
    /// same key (spec §4.8's `getX(name, parent, create)`).
    pub fn get_or_create(
        &self,
        kind: NotifyableKind,
        key: &NotifyableKey,
        name: &str,
        parent: Option<NotifyableKey>,
    ) -> ClusterlibResult<Arc<Notifyable>> {
        if kind == NotifyableKind::Root {
            return Ok(self.get_or_create_root(key));
        }
        let map = self.map_for(kind).ok_or_else(|| {
            ClusterlibError::inconsistent("cache-kind", format!("no typed cache for {kind:?}"))
        })?;
        let mut guard = map.lock();
        if let Some(existing) = guard.get(key) {
            return Ok(existing.clone());
        }
        let created = Notifyable::new(key.clone(), name.to_string(), parent, kind);
        guard.insert(key.clone(), created.clone());
        Ok(created)
    }

    /// Every cached Notifyable whose parent is `key`, scanned across all
    /// seven typed maps — there is no separate child index, the same way
    /// the original resolved `getMyParent` purely from key structure.
    fn children_of(&self, key: &NotifyableKey) -> Vec<Arc<Notifyable>> {
        let maps: [&TypedMap; 7] = [
            &self.applications,
            &self.groups,
            &self.nodes,
            &self.distributions,
            &self.property_lists,
            &self.queues,
            &self.process_slots,
        ];
        maps.iter()
            .flat_map(|m| m.lock().values().cloned().collect::<Vec<_>>())
            .filter(|n| n.parent.as_ref() == Some(key))
            .collect()
    }

    /// Remove `target`, and if `recursive`, its whole cached subtree.
    /// Descendants are moved to REMOVED and appended to the graveyard
    /// before their ancestors (spec §4.8: "in reverse BFS order, leaves
    /// first"). Returns the removed set in that order.
    pub fn remove(
        &self,
        target: &Arc<Notifyable>,
        recursive: bool,
    ) -> ClusterlibResult<Vec<Arc<Notifyable>>> {
        let mut frontier = vec![target.clone()];
        let mut subtree = Vec::new();
        while let Some(current) = frontier.pop() {
            let children = self.children_of(&current.key);
            if !children.is_empty() && !recursive && Arc::ptr_eq(&current, target) {
                return Err(ClusterlibError::InvalidArguments(format!(
                    "{} has children; remove(recursive=true) required",
                    current.key
                )));
            }
            frontier.extend(children);
            subtree.push(current);
        }

        // Every node was appended to `subtree` before its children were
        // discovered, so reversing puts descendants ahead of ancestors.
        subtree.reverse();
        for node in &subtree {
            match self.map_for(node.kind) {
                Some(map) => {
                    map.lock().remove(&node.key);
                }
                None => *self.root.lock() = None,
            }
            node.mark_removed();
            self.graveyard.lock().push(node.clone());
        }
        Ok(subtree)
    }

    pub fn graveyard_len(&self) -> usize {
        self.graveyard.lock().len()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
