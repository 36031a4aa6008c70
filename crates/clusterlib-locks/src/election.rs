// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leader election (spec §4.6): the same bid/predecessor-watch primitive
//! as [`crate::dlock`], in a separate namespace (`bids/` under a Group
//! rather than `locks/`), plus a `currentLeader` pointer published by
//! whoever wins. `LeadershipWatches` tracks every outstanding bid keyed by
//! its path and re-drives them in insertion order on
//! `PRECEDING_LEADER_EXISTS` — a stand-in for the original's
//! `equal_range` iteration order.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use clusterlib_core::key::NotifyableKey;
use clusterlib_core::queue::{BlockingQueue, Timeout};
use clusterlib_core::{ClusterlibError, ClusterlibResult};
use clusterlib_repository::{CreateFlags, Repository, RepositoryError, WatchCallback};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadershipStatus {
    Leader,
    Follower,
}

type WatchMap = Mutex<IndexMap<String, Arc<BlockingQueue<()>>>>;

pub struct LeaderElection {
    repo: Arc<dyn Repository>,
    watches: Arc<WatchMap>,
}

fn leaf_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl LeaderElection {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo, watches: Arc::new(Mutex::new(IndexMap::new())) }
    }

    /// Re-drive every outstanding bid's watch, in the order each bid
    /// registered, when a `PRECEDING_LEADER_EXISTS` backend event reports
    /// the watched predecessor is gone (spec §4.6, §9).
    pub fn drive_on_preceding_leader_exists(&self) -> ClusterlibResult<()> {
        let watches = self.watches.lock();
        for queue in watches.values() {
            queue.put(());
        }
        Ok(())
    }

    fn signal(&self, bid_path: &str) -> ClusterlibResult<()> {
        match self.watches.lock().get(bid_path) {
            Some(queue) => {
                queue.put(());
                Ok(())
            }
            None => Err(ClusterlibError::inconsistent(
                "preceding-leader-exists",
                format!("no waiter registered for bid {bid_path}"),
            )),
        }
    }

    /// Bid for leadership of `group`. Blocks (cooperatively, via a
    /// blocking-pool task) until either this bid is the lowest — becoming
    /// leader — or a predecessor's disappearance re-drives the wait.
    /// Returns the bid's own backend path alongside the status, since the
    /// caller needs it later to call [`Self::abdicate`].
    pub async fn bid(&self, group: &NotifyableKey) -> ClusterlibResult<(LeadershipStatus, String)> {
        let bid_dir = group.leader_bid_dir_key();
        match self.repo.create_node(bid_dir.as_str(), &[], CreateFlags::NONE).await {
            Ok(_) => {}
            Err(RepositoryError::NodeExists(_)) => {}
            Err(e) => return Err(e.into()),
        }
        let bid_path =
            self.repo.create_node(bid_dir.as_str(), &[], CreateFlags::EPHEMERAL_SEQUENCE).await?;

        loop {
            let mut kids = self.repo.get_node_children(bid_dir.as_str(), None).await?;
            kids.sort();
            let lowest = kids.first().cloned().ok_or_else(|| {
                ClusterlibError::inconsistent("election-bid", "bid directory empty after bid was created")
            })?;
            let my_name = leaf_name(&bid_path);
            if lowest == my_name {
                self.repo
                    .set_node_data(group.current_leader_key().as_str(), my_name.as_bytes(), 0)
                    .await
                    .or_else(|e| match e {
                        RepositoryError::NoNode(_) => Ok(clusterlib_repository::NodeStat { version: 0 }),
                        other => Err(other),
                    })?;
                return Ok((LeadershipStatus::Leader, bid_path));
            }

            let watch_path = format!("{bid_dir}/{lowest}");
            let queue = Arc::new(BlockingQueue::new());
            self.watches.lock().insert(watch_path.clone(), queue.clone());

            let watches = self.watches.clone();
            let watch_target = watch_path.clone();
            let callback: WatchCallback = Arc::new(move |_event| {
                if let Some(q) = watches.lock().get(&watch_target) {
                    q.put(());
                }
            });
            let still_exists = self.repo.exists(&watch_path, Some(callback)).await?;
            if !still_exists {
                queue.put(());
            }

            let waiter = queue.clone();
            tokio::task::spawn_blocking(move || waiter.take(Timeout::Forever))
                .await
                .map_err(|_| ClusterlibError::inconsistent("election-bid", "wait task panicked"))?;
            self.watches.lock().shift_remove(&watch_path);
        }
    }

    pub async fn abdicate(&self, group: &NotifyableKey, my_bid_path: &str) -> ClusterlibResult<()> {
        self.repo.delete_node(my_bid_path, false, None).await?;
        self.repo.delete_node(group.current_leader_key().as_str(), false, None).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "election_tests.rs"]
mod tests;
