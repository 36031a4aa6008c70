// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Distributed lock acquire/release (spec §4.5), grounded bit-for-bit on
//! `original_source/common/distributedlocks.cc`: every iteration lists
//! *all* children of the lock directory and waits on the globally lowest
//! bid that isn't its own — not a strict immediate-predecessor watch.
//! This reproduces the original's herd-wakeup characteristic rather than
//! "fixing" it to a textbook predecessor-watch (spec §9 flags this but
//! says not to fix it; see `SPEC_FULL.md` Open Questions).
//!
//! The wait itself is built on [`clusterlib_core::queue::BlockingQueue`]
//! rather than an async notifier, because the predecessor-wait map must
//! stay safely callable from the blocking contexts a backend watch
//! callback fires in — it is not necessarily a tokio task.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use clusterlib_core::key::NotifyableKey;
use clusterlib_core::queue::{BlockingQueue, Timeout};
use clusterlib_core::{ClusterlibError, ClusterlibResult};
use clusterlib_repository::{CreateFlags, Repository, RepositoryError, WatchCallback};

type WaitMap = Mutex<HashMap<String, Arc<BlockingQueue<()>>>>;

struct HeldLock {
    bid_path: String,
    refcount: u64,
}

/// One named lock directory per Notifyable (spec §4.5).
pub struct DistributedLocks {
    repo: Arc<dyn Repository>,
    wait_map: Arc<WaitMap>,
    held: Mutex<HashMap<NotifyableKey, HeldLock>>,
}

fn leaf_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn signal(wait_map: &WaitMap, bid_path: &str) -> ClusterlibResult<()> {
    match wait_map.lock().get(bid_path) {
        Some(queue) => {
            queue.put(());
            Ok(())
        }
        // Open Question #1: a found wait entry signals the condition; a
        // missing one is an inconsistency, not silently ignored.
        None => Err(ClusterlibError::inconsistent(
            "preceding-lock-node-exists",
            format!("no waiter registered for bid {bid_path}"),
        )),
    }
}

impl DistributedLocks {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo, wait_map: Arc::new(Mutex::new(HashMap::new())), held: Mutex::new(HashMap::new()) }
    }

    /// Entry point for the handler wiring: a `PRECEDING_LOCK_NODE_EXISTS`
    /// backend event arriving through the cache/dispatch pipeline signals
    /// whichever acquire loop is waiting on that bid path.
    pub fn signal_preceding_lock_node_exists(&self, bid_path: &str) -> ClusterlibResult<()> {
        signal(&self.wait_map, bid_path)
    }

    pub fn held_refcount(&self, target: &NotifyableKey) -> u64 {
        self.held.lock().get(target).map(|h| h.refcount).unwrap_or(0)
    }

    /// Reentrant: a second `acquire` on an already-held lock just bumps
    /// the refcount.
    pub async fn acquire(&self, target: &NotifyableKey) -> ClusterlibResult<()> {
        {
            let mut held = self.held.lock();
            if let Some(lock) = held.get_mut(target) {
                lock.refcount += 1;
                return Ok(());
            }
        }

        let lock_dir = target.lock_dir_key();
        match self.repo.create_node(lock_dir.as_str(), &[], CreateFlags::NONE).await {
            Ok(_) => {}
            Err(RepositoryError::NodeExists(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let bid_prefix = target.lock_node_key();
        let bid_path =
            self.repo.create_node(bid_prefix.as_str(), &[], CreateFlags::EPHEMERAL_SEQUENCE).await?;

        loop {
            let mut kids = self.repo.get_node_children(lock_dir.as_str(), None).await?;
            kids.sort();
            let lowest = kids.first().cloned().ok_or_else(|| {
                ClusterlibError::inconsistent("dlock-acquire", "lock directory empty after bid was created")
            })?;
            let my_name = leaf_name(&bid_path);
            if lowest == my_name {
                self.held.lock().insert(target.clone(), HeldLock { bid_path, refcount: 1 });
                return Ok(());
            }

            let watch_path = format!("{lock_dir}/{lowest}");
            let queue = Arc::new(BlockingQueue::new());
            self.wait_map.lock().insert(watch_path.clone(), queue.clone());

            let wait_map = self.wait_map.clone();
            let watch_target = watch_path.clone();
            let callback: WatchCallback = Arc::new(move |_event| {
                let _ = signal(&wait_map, &watch_target);
            });
            let still_exists = self.repo.exists(&watch_path, Some(callback)).await?;
            if !still_exists {
                // Vanished between listing and watch-set: the watch will
                // never fire for a node that's already gone, so drive the
                // wait ourselves and re-list immediately.
                queue.put(());
            }

            let waiter = queue.clone();
            tokio::task::spawn_blocking(move || waiter.take(Timeout::Forever))
                .await
                .map_err(|_| ClusterlibError::inconsistent("dlock-acquire", "wait task panicked"))?;
            self.wait_map.lock().remove(&watch_path);
        }
    }

    /// Releases one level of reentrancy; deletes the bid node once the
    /// refcount drops to zero.
    pub async fn release(&self, target: &NotifyableKey) -> ClusterlibResult<()> {
        let bid_path = {
            let mut held = self.held.lock();
            let Some(lock) = held.get_mut(target) else {
                return Err(ClusterlibError::invalid_method(format!(
                    "release called on {target} without a matching acquire"
                )));
            };
            if lock.refcount > 1 {
                lock.refcount -= 1;
                return Ok(());
            }
            match held.remove(target) {
                Some(lock) => lock.bid_path,
                None => {
                    return Err(ClusterlibError::inconsistent(
                        "dlock-release",
                        format!("lock for {target} vanished between check and remove"),
                    ))
                }
            }
        };
        self.repo.delete_node(&bid_path, false, None).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "dlock_tests.rs"]
mod tests;
