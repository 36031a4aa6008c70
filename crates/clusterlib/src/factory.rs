// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Factory`: the process-wide registry of Notifyables and the owner
//! of every background task (spec §4.10, §5). Wires together the
//! `Repository`, the cache/handler table from `clusterlib-cache`, the
//! locking and election primitives from `clusterlib-locks`, the timer
//! wheel from `clusterlib-core`, and the dispatch engine in this crate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use clusterlib_cache::{HandlerKind, HandlerTable, NotifyableCache, SemanticEvent};
use clusterlib_core::key::{self, root_key};
use clusterlib_core::{ClusterlibConfig, ClusterlibError, ClusterlibResult, NotifyableKey, NotifyableKind};
use clusterlib_core::{GenericEvent, TimerPayload, TimerWheel};
use clusterlib_locks::{DistributedLocks, LeaderElection};
use clusterlib_repository::{CreateFlags, Repository, RepositoryError};

use crate::client::Client;
use crate::dispatch::Dispatcher;

/// Owns the cache, the handler table, locks/election, the timer wheel, and
/// the dispatch tasks; the single entry point applications construct to
/// start using clusterlib.
pub struct Factory {
    repo: Arc<dyn Repository>,
    config: ClusterlibConfig,
    cache: Arc<NotifyableCache>,
    handlers: Arc<HandlerTable>,
    dispatcher: Arc<Dispatcher>,
    pub locks: Arc<DistributedLocks>,
    pub election: Arc<LeaderElection>,
    timer_wheel: Arc<TimerWheel>,
    clients: Arc<Mutex<Vec<Arc<Client>>>>,
    next_client_id: AtomicU64,
    next_sync_id: AtomicU64,
    tasks: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl Factory {
    /// Builds the factory and spawns its four long-lived tasks: external
    /// dispatch, internal dispatch, and the timer wheel's worker thread
    /// (spawned by `TimerWheel::spawn` itself). The fourth, a
    /// timer-handler task draining the wheel's generic-event sink, is
    /// spawned here since the wheel already invokes handlers inline from
    /// its own thread and this task exists to observe that stream for
    /// diagnostics (spec §4.10).
    pub fn new(repo: Arc<dyn Repository>, config: ClusterlibConfig) -> Arc<Self> {
        let cache = Arc::new(NotifyableCache::new());
        let mut handlers = HandlerTable::with_default_attribute_handlers();
        handlers.register(
            HandlerKind::Leadership,
            Box::new(clusterlib_cache::AttributeChangeHandler::new(
                HandlerKind::Leadership,
                SemanticEvent::LeadershipChange,
            )),
        );
        let handlers = Arc::new(handlers);
        let dispatcher = Dispatcher::new();
        let locks = Arc::new(DistributedLocks::new(Arc::clone(&repo)));
        let election = Arc::new(LeaderElection::new(Arc::clone(&repo)));
        let timer_wheel = TimerWheel::spawn(config.timer_wheel_resolution, |_event: GenericEvent<Arc<TimerPayload>>| {});
        let clients = Arc::new(Mutex::new(Vec::new()));

        let factory = Arc::new(Self {
            repo,
            config,
            cache,
            handlers,
            dispatcher,
            locks,
            election,
            timer_wheel,
            clients,
            next_client_id: AtomicU64::new(1),
            next_sync_id: AtomicU64::new(0),
            tasks: Mutex::new(Vec::new()),
        });

        let external =
            factory.dispatcher.spawn_external(Arc::clone(&factory.repo), Arc::clone(&factory.cache), Arc::clone(&factory.handlers), Arc::clone(&factory.clients));
        let internal = factory.dispatcher.spawn_internal();
        factory.tasks.lock().push(external);
        factory.tasks.lock().push(internal);

        factory
    }

    pub fn cache(&self) -> &Arc<NotifyableCache> {
        &self.cache
    }

    pub fn repo(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    pub fn config(&self) -> &ClusterlibConfig {
        &self.config
    }

    pub fn root(&self) -> Arc<clusterlib_cache::Notifyable> {
        self.cache.get_or_create_root(&root_key())
    }

    /// Spawns a new `Client`, registering it to receive every semantic
    /// event and the eventual end-event.
    pub fn new_client(self: &Arc<Self>) -> Arc<Client> {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let (client, task) = Client::spawn(id);
        self.clients.lock().push(Arc::clone(&client));
        self.tasks.lock().push(task);
        client
    }

    /// `getX(name, parent, create)` (spec §4.8): consult the cache, then
    /// the backend, creating the backend node only if `create` and it is
    /// missing. Shared across every Notifyable kind below.
    async fn resolve_or_create(
        &self,
        kind: NotifyableKind,
        key: &NotifyableKey,
        name: &str,
        parent: Option<NotifyableKey>,
        create: bool,
    ) -> ClusterlibResult<Option<Arc<clusterlib_cache::Notifyable>>> {
        if let Some(existing) = self.cache.get(kind, key) {
            return Ok(Some(existing));
        }
        match self.repo.exists(key.as_str(), Some(self.dispatcher.watch_for(HandlerKind::NotifyableState, key.clone()))).await {
            Ok(true) => Ok(Some(self.cache.get_or_create(kind, key, name, parent)?)),
            Ok(false) => {
                if !create {
                    return Ok(None);
                }
                match self.repo.create_node(key.as_str(), &[], CreateFlags::NONE).await {
                    Ok(_) | Err(RepositoryError::NodeExists(_)) => {
                        Ok(Some(self.cache.get_or_create(kind, key, name, parent)?))
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn application(&self, name: &str, create: bool) -> ClusterlibResult<Option<Arc<clusterlib_cache::Notifyable>>> {
        let app_key = key::compose_app_key(name);
        self.resolve_or_create(NotifyableKind::Application, &app_key, name, Some(root_key()), create).await
    }

    pub async fn group(
        &self,
        parent: &NotifyableKey,
        name: &str,
        create: bool,
    ) -> ClusterlibResult<Option<Arc<clusterlib_cache::Notifyable>>> {
        let group_key = key::compose_group_key(parent, name);
        self.resolve_or_create(NotifyableKind::Group, &group_key, name, Some(parent.clone()), create).await
    }

    pub async fn node(
        &self,
        parent: &NotifyableKey,
        name: &str,
        create: bool,
    ) -> ClusterlibResult<Option<Arc<clusterlib_cache::Notifyable>>> {
        let node_key = key::compose_node_key(parent, name);
        self.resolve_or_create(NotifyableKind::Node, &node_key, name, Some(parent.clone()), create).await
    }

    pub async fn data_distribution(
        &self,
        parent: &NotifyableKey,
        name: &str,
        create: bool,
    ) -> ClusterlibResult<Option<Arc<clusterlib_cache::Notifyable>>> {
        let dist_key = key::compose_dist_key(parent, name);
        self.resolve_or_create(NotifyableKind::DataDistribution, &dist_key, name, Some(parent.clone()), create).await
    }

    pub async fn property_list(
        &self,
        parent: &NotifyableKey,
        name: &str,
        create: bool,
    ) -> ClusterlibResult<Option<Arc<clusterlib_cache::Notifyable>>> {
        let pl_key = key::compose_property_list_key(parent, name);
        self.resolve_or_create(NotifyableKind::PropertyList, &pl_key, name, Some(parent.clone()), create).await
    }

    pub async fn queue(
        &self,
        parent: &NotifyableKey,
        name: &str,
        create: bool,
    ) -> ClusterlibResult<Option<Arc<clusterlib_cache::Notifyable>>> {
        let queue_key = key::compose_queue_key(parent, name);
        self.resolve_or_create(NotifyableKind::Queue, &queue_key, name, Some(parent.clone()), create).await
    }

    pub async fn process_slot(
        &self,
        parent: &NotifyableKey,
        name: &str,
        create: bool,
    ) -> ClusterlibResult<Option<Arc<clusterlib_cache::Notifyable>>> {
        let slot_key = key::compose_process_slot_key(parent, name);
        self.resolve_or_create(NotifyableKind::ProcessSlot, &slot_key, name, Some(parent.clone()), create).await
    }

    /// `remove(recursive)` (spec §4.8): root and a non-empty, non-recursive
    /// target are rejected; otherwise the cached subtree is moved to the
    /// graveyard and the backend key is deleted recursively.
    pub async fn remove(&self, target: &Arc<clusterlib_cache::Notifyable>, recursive: bool) -> ClusterlibResult<()> {
        if target.kind == NotifyableKind::Root {
            return Err(ClusterlibError::invalid_method("the root notifyable cannot be removed"));
        }
        let removed = self.cache.remove(target, recursive)?;
        self.repo.delete_node(target.key.as_str(), true, None).await?;
        drop(removed);
        Ok(())
    }

    /// `synchronize()` (spec §4.10): issues a monotonic sync id, asks the
    /// backend to flush on the root key, and blocks (via the blocking-pool
    /// bridge the rest of this crate uses for sync primitives) until the
    /// completion counter catches up.
    pub async fn synchronize(&self) -> ClusterlibResult<()> {
        self.next_sync_id.fetch_add(1, Ordering::SeqCst);

        // Signals completion directly rather than through the dispatcher
        // queue: `synchronize` needs a point notification, not a cache
        // update, matching how `DistributedLocks`/`LeaderElection` bypass
        // the dispatcher for their own wake primitives.
        let completed = Arc::new(Mutex::new(false));
        let condvar = Arc::new(parking_lot::Condvar::new());
        let completed_for_cb = Arc::clone(&completed);
        let condvar_for_cb = Arc::clone(&condvar);
        let sync_callback: clusterlib_repository::WatchCallback = Arc::new(move |_event| {
            *completed_for_cb.lock() = true;
            condvar_for_cb.notify_all();
        });
        self.repo.sync(root_key().as_str(), sync_callback).await?;

        let deadline = self.config.synchronize_timeout;
        let mut guard = completed.lock();
        if !*guard {
            let timed_out = condvar.wait_for(&mut guard, deadline).timed_out();
            if timed_out && !*guard {
                return Err(ClusterlibError::inconsistent("synchronize", "timed out waiting for completion"));
            }
        }
        Ok(())
    }

    pub fn timer_wheel(&self) -> &Arc<TimerWheel> {
        &self.timer_wheel
    }

    /// Cooperative shutdown (spec §4.10): flips the dispatcher's shutdown
    /// flag, which the external loop observes on its next 100ms wake and
    /// responds to by issuing the end-event to every client exactly once.
    pub async fn shutdown(&self) {
        self.dispatcher.request_shutdown();
        self.timer_wheel.shutdown();
        let tasks: Vec<_> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
