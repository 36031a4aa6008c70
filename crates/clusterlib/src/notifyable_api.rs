// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The public typed handles (spec §3, §9 REDESIGN FLAGS): Root,
//! Application, Group, Node, DataDistribution, PropertyList, Queue, and
//! ProcessSlot each wrap a cached [`Notifyable`] plus the owning
//! [`Factory`], with the shared capability set (`key`, `acquireLock`,
//! `remove`, `getMyGroup`, `getMyApplication`) lifted into the
//! [`ClusterObject`] trait rather than a base-class hierarchy.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use clusterlib_cache::Notifyable;
use clusterlib_core::key::parse_key;
use clusterlib_core::{ClusterlibResult, NotifyableKey, NotifyableKind};
use clusterlib_dist::{DataDistribution, HashFunctionIndex, ResolvedTarget};
use clusterlib_queue::{CurrentProcessState, ProcessSlot, PropertyList, PropertyListError};
use clusterlib_repository::RepositoryError;

use crate::factory::Factory;

/// Shared behavior over every kind of cached Notifyable (spec §9: tagged
/// variant instead of a virtual base class).
#[async_trait]
pub trait ClusterObject: Send + Sync {
    fn inner(&self) -> &Arc<Notifyable>;
    fn factory(&self) -> &Arc<Factory>;

    fn key(&self) -> &NotifyableKey {
        &self.inner().key
    }

    fn name(&self) -> &str {
        &self.inner().name
    }

    fn is_removed(&self) -> bool {
        matches!(self.inner().state(), clusterlib_cache::NotifyableState::Removed)
    }

    /// Acquires the distributed lock namespaced under this Notifyable's
    /// key (spec §4.5). Reentrant.
    async fn acquire_lock(&self) -> ClusterlibResult<()> {
        self.inner().require_ready()?;
        self.factory().locks.acquire(self.key()).await
    }

    async fn release_lock(&self) -> ClusterlibResult<()> {
        self.factory().locks.release(self.key()).await
    }

    /// Removes this Notifyable from the cache and the backend (spec
    /// §4.8). Rejects a non-empty target unless `recursive`.
    async fn remove(&self, recursive: bool) -> ClusterlibResult<()> {
        self.factory().remove(self.inner(), recursive).await
    }

    /// Nearest Application ancestor, resolved purely from key structure
    /// (spec §4.8's `getMyApplication`).
    fn get_my_application(&self) -> Option<Arc<Notifyable>> {
        ancestor_of_kind(self.factory(), self.key(), NotifyableKind::Application)
    }

    /// Nearest Group ancestor, if this Notifyable is nested under one
    /// (spec §4.8's `getMyGroup`; `None` for a top-level Application).
    fn get_my_group(&self) -> Option<Arc<Notifyable>> {
        ancestor_of_kind(self.factory(), self.key(), NotifyableKind::Group)
    }
}

fn ancestor_of_kind(factory: &Factory, key: &NotifyableKey, want: NotifyableKind) -> Option<Arc<Notifyable>> {
    let mut current = parse_key(key.as_str())?.parent.map(str::to_string);
    while let Some(ancestor) = current {
        let parsed = parse_key(&ancestor)?;
        if parsed.kind == want {
            return factory.cache().get(want, &NotifyableKey::new(ancestor));
        }
        current = parsed.parent.map(str::to_string);
    }
    None
}

macro_rules! cluster_object_handle {
    ($name:ident) => {
        pub struct $name {
            node: Arc<Notifyable>,
            factory: Arc<Factory>,
        }

        impl ClusterObject for $name {
            fn inner(&self) -> &Arc<Notifyable> {
                &self.node
            }
            fn factory(&self) -> &Arc<Factory> {
                &self.factory
            }
        }

        impl $name {
            /// Wraps an already-resolved cache entry, e.g. one returned by
            /// [`ClusterObject::get_my_group`]/[`ClusterObject::get_my_application`].
            pub(crate) fn from_notifyable(node: Arc<Notifyable>, factory: Arc<Factory>) -> Self {
                Self { node, factory }
            }
        }
    };
}

cluster_object_handle!(Root);
cluster_object_handle!(Application);
cluster_object_handle!(Group);
cluster_object_handle!(ComputeNode);
cluster_object_handle!(Queue);

/// The `root` Notifyable: the sole entry point for reaching any
/// Application (spec §3).
impl Root {
    pub fn new(factory: Arc<Factory>) -> Self {
        let node = factory.root();
        Self { node, factory }
    }

    pub async fn application(&self, name: &str, create: bool) -> ClusterlibResult<Option<Application>> {
        Ok(self
            .factory
            .application(name, create)
            .await?
            .map(|node| Application { node, factory: self.factory.clone() }))
    }
}

impl Application {
    pub async fn group(&self, name: &str, create: bool) -> ClusterlibResult<Option<Group>> {
        resolve_group(&self.factory, self.key(), name, create).await
    }

    pub async fn node(&self, name: &str, create: bool) -> ClusterlibResult<Option<ComputeNode>> {
        resolve_node(&self.factory, self.key(), name, create).await
    }

    pub async fn data_distribution(
        &self,
        name: &str,
        create: bool,
        hash_function: HashFunctionIndex,
    ) -> ClusterlibResult<Option<DataDistributionHandle>> {
        resolve_data_distribution(&self.factory, self.key(), name, create, hash_function).await
    }

    pub async fn property_list(&self, name: &str, create: bool) -> ClusterlibResult<Option<PropertyListHandle>> {
        resolve_property_list(&self.factory, self.key(), name, create).await
    }
}

impl Group {
    pub async fn group(&self, name: &str, create: bool) -> ClusterlibResult<Option<Group>> {
        resolve_group(&self.factory, self.key(), name, create).await
    }

    pub async fn node(&self, name: &str, create: bool) -> ClusterlibResult<Option<ComputeNode>> {
        resolve_node(&self.factory, self.key(), name, create).await
    }

    pub async fn queue(&self, name: &str, create: bool) -> ClusterlibResult<Option<Queue>> {
        Ok(self
            .factory
            .queue(self.key(), name, create)
            .await?
            .map(|node| Queue { node, factory: self.factory.clone() }))
    }

    pub async fn process_slot(&self, name: &str, create: bool) -> ClusterlibResult<Option<ProcessSlotHandle>> {
        let node = self.factory.process_slot(self.key(), name, create).await?;
        Ok(match node {
            Some(node) => {
                let mut slot = ProcessSlot::new(node.key.clone());
                // A freshly created slot has nothing published yet; a
                // pre-existing one is loaded immediately so the handle
                // starts consistent with the backend (spec §4.12).
                match slot.refresh(self.factory.repo()).await {
                    Ok(()) => {}
                    Err(PropertyListError::Repository(RepositoryError::NoNode(_))) => {}
                    Err(e) => return Err(clusterlib_core::ClusterlibError::inconsistent("process-slot-refresh", e.to_string())),
                }
                Some(ProcessSlotHandle { node, factory: self.factory.clone(), slot: Mutex::new(slot) })
            }
            None => None,
        })
    }

    /// Bids for leadership of this Group (spec §4.6), blocking until this
    /// bid becomes the lowest outstanding one.
    pub async fn bid_for_leadership(&self) -> ClusterlibResult<LeadershipBid> {
        let (status, bid_path) = self.factory.election.bid(self.key()).await?;
        Ok(LeadershipBid { status, bid_path, group: self.key().clone(), factory: self.factory.clone() })
    }

    pub fn current_leader(&self) -> Option<Vec<u8>> {
        self.node.attribute("currentLeader")
    }
}

/// Outcome of [`Group::bid_for_leadership`]: carries the bid's own backend
/// path so the winner can later [`Self::abdicate`].
pub struct LeadershipBid {
    pub status: clusterlib_locks::LeadershipStatus,
    bid_path: String,
    group: NotifyableKey,
    factory: Arc<Factory>,
}

impl LeadershipBid {
    pub async fn abdicate(&self) -> ClusterlibResult<()> {
        self.factory.election.abdicate(&self.group, &self.bid_path).await
    }
}

async fn resolve_group(
    factory: &Arc<Factory>,
    parent: &NotifyableKey,
    name: &str,
    create: bool,
) -> ClusterlibResult<Option<Group>> {
    Ok(factory.group(parent, name, create).await?.map(|node| Group { node, factory: factory.clone() }))
}

async fn resolve_node(
    factory: &Arc<Factory>,
    parent: &NotifyableKey,
    name: &str,
    create: bool,
) -> ClusterlibResult<Option<ComputeNode>> {
    Ok(factory.node(parent, name, create).await?.map(|node| ComputeNode { node, factory: factory.clone() }))
}

async fn resolve_data_distribution(
    factory: &Arc<Factory>,
    parent: &NotifyableKey,
    name: &str,
    create: bool,
    hash_function: HashFunctionIndex,
) -> ClusterlibResult<Option<DataDistributionHandle>> {
    let node = factory.data_distribution(parent, name, create).await?;
    Ok(match node {
        Some(node) => {
            let mut dist = DataDistribution::new(hash_function);
            load_distribution(factory.repo(), &node.key, &mut dist).await?;
            Some(DataDistributionHandle { node, factory: factory.clone(), dist: Mutex::new(dist) })
        }
        None => None,
    })
}

async fn resolve_property_list(
    factory: &Arc<Factory>,
    parent: &NotifyableKey,
    name: &str,
    create: bool,
) -> ClusterlibResult<Option<PropertyListHandle>> {
    let node = factory.property_list(parent, name, create).await?;
    Ok(match node {
        Some(node) => {
            let mut list = PropertyList::new(node.key.clone());
            match list.refresh(factory.repo()).await {
                Ok(()) => {}
                Err(PropertyListError::Repository(RepositoryError::NoNode(_))) => {}
                Err(e) => return Err(clusterlib_core::ClusterlibError::inconsistent("property-list-refresh", e.to_string())),
            }
            Some(PropertyListHandle { node, factory: factory.clone(), list: Mutex::new(list) })
        }
        None => None,
    })
}

fn shards_path(key: &NotifyableKey) -> String {
    format!("{key}/shards")
}

fn overrides_path(key: &NotifyableKey) -> String {
    format!("{key}/manualOverrides")
}

async fn load_distribution(
    repo: &dyn clusterlib_repository::Repository,
    key: &NotifyableKey,
    dist: &mut DataDistribution,
) -> ClusterlibResult<()> {
    match repo.get_node_data(&shards_path(key), None).await {
        Ok((data, stat)) => {
            dist.load_wire_shards(&String::from_utf8_lossy(&data))
                .map_err(|e| clusterlib_core::ClusterlibError::inconsistent("shards-wire", e.to_string()))?;
            dist.record_shards_version(stat.version);
        }
        Err(RepositoryError::NoNode(_)) => {}
        Err(e) => return Err(e.into()),
    }
    match repo.get_node_data(&overrides_path(key), None).await {
        Ok((data, stat)) => {
            dist.load_wire_overrides(&String::from_utf8_lossy(&data))
                .map_err(|e| clusterlib_core::ClusterlibError::inconsistent("overrides-wire", e.to_string()))?;
            dist.record_overrides_version(stat.version);
        }
        Err(RepositoryError::NoNode(_)) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// A DataDistribution Notifyable (spec §4.7): in-memory shard/override
/// staging plus the versioned publish against the backend.
pub struct DataDistributionHandle {
    node: Arc<Notifyable>,
    factory: Arc<Factory>,
    dist: Mutex<DataDistribution>,
}

impl ClusterObject for DataDistributionHandle {
    fn inner(&self) -> &Arc<Notifyable> {
        &self.node
    }
    fn factory(&self) -> &Arc<Factory> {
        &self.factory
    }
}

impl DataDistributionHandle {
    pub async fn find_covering_node(&self, lookup_key: &str) -> Option<ResolvedTarget> {
        self.dist.lock().await.find_covering_node(lookup_key)
    }

    pub async fn is_covered(&self) -> bool {
        self.dist.lock().await.is_covered()
    }

    pub async fn stage_shards(&self, shards: Vec<clusterlib_dist::Shard>) {
        self.dist.lock().await.set_shards(shards);
    }

    pub async fn stage_overrides(&self, overrides: Vec<clusterlib_dist::ManualOverride>) {
        self.dist.lock().await.set_overrides(overrides);
    }

    /// Publishes the staged shards and overrides with CAS semantics
    /// against their own version, same discipline as `PropertyList`.
    pub async fn publish(&self) -> ClusterlibResult<()> {
        let (shards_wire, overrides_wire, shards_version, overrides_version) = {
            let dist = self.dist.lock().await;
            (
                dist.to_wire_shards().map_err(|e| clusterlib_core::ClusterlibError::inconsistent("shards-wire", e.to_string()))?,
                dist.to_wire_overrides().map_err(|e| clusterlib_core::ClusterlibError::inconsistent("overrides-wire", e.to_string()))?,
                dist.shards_version(),
                dist.overrides_version(),
            )
        };
        let repo = self.factory.repo();
        let new_shards_version =
            publish_versioned(repo, &shards_path(&self.node.key), shards_wire.as_bytes(), shards_version).await?;
        let new_overrides_version =
            publish_versioned(repo, &overrides_path(&self.node.key), overrides_wire.as_bytes(), overrides_version)
                .await?;
        let mut dist = self.dist.lock().await;
        dist.record_shards_version(new_shards_version);
        dist.record_overrides_version(new_overrides_version);
        Ok(())
    }
}

/// Shared CAS-with-create-fallback publish, the same shape as
/// `clusterlib_queue::PropertyList::publish`. Also used by
/// `crate::server` to publish `clientState`.
pub(crate) async fn publish_versioned(
    repo: &dyn clusterlib_repository::Repository,
    path: &str,
    data: &[u8],
    version: i64,
) -> ClusterlibResult<i64> {
    match repo.set_node_data(path, data, version).await {
        Ok(stat) => Ok(stat.version),
        Err(RepositoryError::NoNode(_)) => {
            match repo.create_node(path, data, clusterlib_repository::CreateFlags::NONE).await {
                Ok(_) => Ok(0),
                Err(RepositoryError::NodeExists(_)) => Err(clusterlib_core::ClusterlibError::inconsistent(
                    "data-distribution-publish",
                    "lost a create race, caller must reload and retry",
                )),
                Err(e) => Err(e.into()),
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// A PropertyList Notifyable (spec §4.12): thin wrapper over
/// `clusterlib_queue::PropertyList` adding the Notifyable capability set.
pub struct PropertyListHandle {
    node: Arc<Notifyable>,
    factory: Arc<Factory>,
    list: Mutex<PropertyList>,
}

impl ClusterObject for PropertyListHandle {
    fn inner(&self) -> &Arc<Notifyable> {
        &self.node
    }
    fn factory(&self) -> &Arc<Factory> {
        &self.factory
    }
}

impl PropertyListHandle {
    pub async fn get(&self, name: &str) -> Option<String> {
        self.list.lock().await.get(name).map(str::to_string)
    }

    pub async fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.list.lock().await.set(name, value);
    }

    pub async fn erase(&self, name: &str) -> bool {
        self.list.lock().await.erase(name)
    }

    pub async fn refresh(&self) -> Result<(), PropertyListError> {
        self.list.lock().await.refresh(self.factory.repo()).await
    }

    pub async fn publish(&self) -> Result<(), PropertyListError> {
        self.list.lock().await.publish(self.factory.repo()).await
    }
}

impl Queue {
    pub async fn put(&self, element: &[u8]) -> Result<String, RepositoryError> {
        clusterlib_queue::Queue::new(self.node.key.clone()).put(self.factory.repo(), element).await
    }

    pub async fn take(&self) -> Result<Option<Vec<u8>>, RepositoryError> {
        clusterlib_queue::Queue::new(self.node.key.clone()).take(self.factory.repo()).await
    }

    pub async fn size(&self) -> Result<usize, RepositoryError> {
        clusterlib_queue::Queue::new(self.node.key.clone()).size(self.factory.repo()).await
    }
}

/// A ProcessSlot Notifyable (spec §4.12): the per-slot `state`/`execArgs`/
/// `ports`/`pid`/`reservationName` record, following the same
/// load-then-CAS-publish discipline as [`PropertyListHandle`].
pub struct ProcessSlotHandle {
    node: Arc<Notifyable>,
    factory: Arc<Factory>,
    slot: Mutex<ProcessSlot>,
}

impl ClusterObject for ProcessSlotHandle {
    fn inner(&self) -> &Arc<Notifyable> {
        &self.node
    }
    fn factory(&self) -> &Arc<Factory> {
        &self.factory
    }
}

impl ProcessSlotHandle {
    pub async fn state(&self) -> CurrentProcessState {
        self.slot.lock().await.state()
    }

    pub async fn set_state(&self, state: CurrentProcessState) {
        self.slot.lock().await.set_state(state);
    }

    pub async fn pid(&self) -> Option<u32> {
        self.slot.lock().await.pid()
    }

    pub async fn set_pid(&self, pid: Option<u32>) {
        self.slot.lock().await.set_pid(pid);
    }

    pub async fn refresh(&self) -> Result<(), PropertyListError> {
        self.slot.lock().await.refresh(self.factory.repo()).await
    }

    pub async fn publish(&self) -> Result<(), PropertyListError> {
        self.slot.lock().await.publish(self.factory.repo()).await
    }
}

#[cfg(test)]
#[path = "notifyable_api_tests.rs"]
mod tests;
