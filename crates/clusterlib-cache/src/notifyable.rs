// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tagged-variant Notifyable (spec §9 REDESIGN FLAGS): rather than the
//! original's virtual-inheritance diamond, every Notifyable is one struct
//! with a `kind` tag and an embedded "common" record; type-specific
//! behavior dispatches on `kind` in the layers above this crate instead of
//! through a vtable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use clusterlib_core::{ClusterlibError, ClusterlibResult, NotifyableKey, NotifyableKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyableState {
    Ready,
    Removed,
}

/// A managed object in the cluster tree. Attribute leaves (shards, property
/// values, node client-state, ...) are cached as opaque bytes keyed by
/// attribute name — the wire-level meaning of those bytes is interpreted
/// by the crate that owns that attribute (`clusterlib-dist`,
/// `clusterlib-queue`, `clusterlib`), not by the cache itself.
#[derive(Debug)]
pub struct Notifyable {
    pub key: NotifyableKey,
    pub name: String,
    pub parent: Option<NotifyableKey>,
    pub kind: NotifyableKind,
    state: Mutex<NotifyableState>,
    attributes: Mutex<HashMap<String, Vec<u8>>>,
    pub lock_refcount: AtomicU64,
}

impl Notifyable {
    pub fn new(
        key: NotifyableKey,
        name: String,
        parent: Option<NotifyableKey>,
        kind: NotifyableKind,
    ) -> Arc<Self> {
        Arc::new(Self {
            key,
            name,
            parent,
            kind,
            state: Mutex::new(NotifyableState::Ready),
            attributes: Mutex::new(HashMap::new()),
            lock_refcount: AtomicU64::new(0),
        })
    }

    pub fn state(&self) -> NotifyableState {
        *self.state.lock()
    }

    pub fn mark_removed(&self) {
        *self.state.lock() = NotifyableState::Removed;
    }

    /// Every public operation on a Notifyable handle goes through this
    /// first: REMOVED is terminal (spec §3).
    pub fn require_ready(&self) -> ClusterlibResult<()> {
        match self.state() {
            NotifyableState::Ready => Ok(()),
            NotifyableState::Removed => {
                Err(ClusterlibError::ObjectRemoved { key: self.key.to_string() })
            }
        }
    }

    pub fn attribute(&self, name: &str) -> Option<Vec<u8>> {
        self.attributes.lock().get(name).cloned()
    }

    /// Updates the cached attribute and reports whether the value actually
    /// changed — callers (the CachedObjectChangeHandler contract, step 3)
    /// use this to suppress NOEVENT on unchanged backend reads.
    pub fn set_attribute_if_changed(&self, name: &str, value: Option<Vec<u8>>) -> bool {
        let mut attrs = self.attributes.lock();
        match value {
            None => attrs.remove(name).is_some(),
            Some(bytes) => {
                let changed = attrs.get(name) != Some(&bytes);
                attrs.insert(name.to_string(), bytes);
                changed
            }
        }
    }
}

#[cfg(test)]
#[path = "notifyable_tests.rs"]
mod tests;
