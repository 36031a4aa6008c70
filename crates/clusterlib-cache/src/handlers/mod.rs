// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CachedObjectChangeHandlers (spec §4.4): a table of per-attribute-kind
//! handler closures. Every handler follows the same four-step contract —
//! null check, re-arm watch, update cached attribute, suppress NOEVENT on
//! an unchanged value — so eleven of the fifteen kinds share one generic
//! [`AttributeChangeHandler`] implementation parameterized only by which
//! attribute name they cache and which semantic event they emit on
//! change. The remaining four (`LEADERSHIP`, `PRECEDING_LEADER_EXISTS`,
//! `PRECEDING_LOCK_NODE_EXISTS`, `SYNCHRONIZE`) signal conditions owned by
//! `clusterlib-locks` and the dispatcher (wait-maps, the synchronize
//! barrier) that this crate has no visibility into, so callers register
//! their own handlers for those kinds via [`HandlerTable::register`].

use std::collections::HashMap;

use parking_lot::Mutex;

use clusterlib_core::{ClusterlibError, ClusterlibResult, NotifyableKey};

use crate::notifyable::Notifyable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    NotifyableState,
    Applications,
    Groups,
    DataDistributions,
    Nodes,
    PropertiesValues,
    Shards,
    ManualOverrides,
    NodeClientState,
    NodeMasterSetState,
    NodeConnection,
    Leadership,
    PrecedingLeaderExists,
    PrecedingLockNodeExists,
    Synchronize,
}

impl HandlerKind {
    /// Name under which [`Notifyable::set_attribute_if_changed`] caches
    /// this kind's raw bytes. Only meaningful for the eleven attribute
    /// kinds handled by [`AttributeChangeHandler`].
    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::NotifyableState => "notifyableState",
            Self::Applications => "applications",
            Self::Groups => "groups",
            Self::DataDistributions => "dataDistributions",
            Self::Nodes => "nodes",
            Self::PropertiesValues => "keyVal",
            Self::Shards => "shards",
            Self::ManualOverrides => "manualOverrides",
            Self::NodeClientState => "clientState",
            Self::NodeMasterSetState => "masterSetState",
            Self::NodeConnection => "connected",
            Self::Leadership | Self::PrecedingLeaderExists | Self::PrecedingLockNodeExists | Self::Synchronize => {
                ""
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendEventType {
    Created,
    Deleted,
    Changed,
    Child,
    Session,
    NotWatching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticEvent {
    Ready,
    NotifyableStateChange,
    ApplicationsChange,
    GroupsChange,
    DataDistributionsChange,
    NodesChange,
    PropertiesValueChange,
    ShardsChange,
    ManualOverridesChange,
    NodeClientStateChange,
    NodeMasterSetStateChange,
    NodeConnectionChange,
    LeadershipChange,
    PrecedingLeaderExistsChange,
    PrecedingLockNodeExistsChange,
    SynchronizeComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    NoEvent,
    Semantic(SemanticEvent),
}

/// Re-arms the one-shot backend watch for `(kind, key)` and returns the
/// fresh raw attribute bytes in the same round trip — mirrors the
/// coordination service's own API, where `getData`/`getChildren`/`exists`
/// all take the watch as a parameter of the read. `None` means the node
/// itself is gone.
pub trait BackendAccess: Send + Sync {
    fn refresh(&self, kind: HandlerKind, key: &NotifyableKey) -> ClusterlibResult<Option<Vec<u8>>>;
}

/// `(Notifyable?, backendEventType, key) -> SemanticEvent` (spec §4.4).
pub trait CachedObjectChangeHandler: Send + Sync {
    fn handle(
        &self,
        target: Option<&Notifyable>,
        backend_event: BackendEventType,
        key: &NotifyableKey,
        backend: &dyn BackendAccess,
    ) -> ClusterlibResult<HandlerOutcome>;
}

/// The eleven attribute-cache handlers share this implementation.
pub struct AttributeChangeHandler {
    kind: HandlerKind,
    on_change: SemanticEvent,
}

impl AttributeChangeHandler {
    pub fn new(kind: HandlerKind, on_change: SemanticEvent) -> Self {
        Self { kind, on_change }
    }
}

impl CachedObjectChangeHandler for AttributeChangeHandler {
    fn handle(
        &self,
        target: Option<&Notifyable>,
        backend_event: BackendEventType,
        key: &NotifyableKey,
        backend: &dyn BackendAccess,
    ) -> ClusterlibResult<HandlerOutcome> {
        // Step 1: null check.
        let Some(target) = target else {
            tracing::debug!(%key, kind = ?self.kind, "cache miss for backend event, dropping");
            return Ok(HandlerOutcome::NoEvent);
        };

        if backend_event == BackendEventType::Deleted {
            target.mark_removed();
            return Ok(HandlerOutcome::Semantic(SemanticEvent::NotifyableStateChange));
        }

        // Step 2: re-arm watch (folded into the same call as the read).
        let fresh = backend.refresh(self.kind, key)?;

        // Step 3 + 4: update the cached attribute, suppress NOEVENT if
        // the value didn't actually change.
        let changed = target.set_attribute_if_changed(self.kind.attribute_name(), fresh);
        if changed {
            Ok(HandlerOutcome::Semantic(self.on_change))
        } else {
            Ok(HandlerOutcome::NoEvent)
        }
    }
}

/// Keyed by `(HandlerKind, NotifyableKey)`, held under one mutex so that
/// consulting and flipping the callback-ready flag brackets the handler
/// call atomically — two racing deliveries for the same `(kind, key)`
/// can never both fire a user-visible event (spec §4.4).
pub struct HandlerTable {
    ready: Mutex<HashMap<(HandlerKind, NotifyableKey), bool>>,
    handlers: HashMap<HandlerKind, Box<dyn CachedObjectChangeHandler>>,
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerTable {
    pub fn new() -> Self {
        Self { ready: Mutex::new(HashMap::new()), handlers: HashMap::new() }
    }

    /// Populate the table with the eleven generic attribute handlers.
    /// `LEADERSHIP`, `PRECEDING_LEADER_EXISTS`, `PRECEDING_LOCK_NODE_EXISTS`,
    /// and `SYNCHRONIZE` are left unregistered — the crates that own those
    /// conditions (`clusterlib-locks`, `clusterlib`) register them.
    pub fn with_default_attribute_handlers() -> Self {
        use HandlerKind::*;
        use SemanticEvent::*;
        let mut table = Self::new();
        let defaults: [(HandlerKind, SemanticEvent); 11] = [
            (NotifyableState, NotifyableStateChange),
            (Applications, ApplicationsChange),
            (Groups, GroupsChange),
            (DataDistributions, DataDistributionsChange),
            (Nodes, NodesChange),
            (PropertiesValues, PropertiesValueChange),
            (Shards, ShardsChange),
            (ManualOverrides, ManualOverridesChange),
            (NodeClientState, NodeClientStateChange),
            (NodeMasterSetState, NodeMasterSetStateChange),
            (NodeConnection, NodeConnectionChange),
        ];
        for (kind, semantic) in defaults {
            table.register(kind, Box::new(AttributeChangeHandler::new(kind, semantic)));
        }
        table
    }

    pub fn register(&mut self, kind: HandlerKind, handler: Box<dyn CachedObjectChangeHandler>) {
        self.handlers.insert(kind, handler);
    }

    /// Claim the callback-ready flag for `(kind, key)`, run the handler if
    /// claimed, then release the flag for the next backend event. A
    /// concurrent dispatch that arrives while the flag is claimed is
    /// suppressed rather than double-firing.
    pub fn dispatch(
        &self,
        kind: HandlerKind,
        target: Option<&Notifyable>,
        backend_event: BackendEventType,
        key: &NotifyableKey,
        backend: &dyn BackendAccess,
    ) -> ClusterlibResult<HandlerOutcome> {
        {
            let mut ready = self.ready.lock();
            let flag = ready.entry((kind, key.clone())).or_insert(true);
            if !*flag {
                return Ok(HandlerOutcome::NoEvent);
            }
            *flag = false;
        }

        let handler = self.handlers.get(&kind).ok_or_else(|| {
            ClusterlibError::inconsistent("handler-table", format!("no handler registered for {kind:?}"))
        })?;
        let outcome = handler.handle(target, backend_event, key, backend);

        let mut ready = self.ready.lock();
        ready.insert((kind, key.clone()), true);
        outcome
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
