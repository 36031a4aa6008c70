// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Queue` (spec §4.12): a FIFO backed entirely by sequential child nodes
//! under the queue's key — no client-side buffering. `put` creates a
//! sequential child; `take` reads and deletes the lowest-sequence child
//! atomically from the caller's point of view (read-then-delete-by-version,
//! so a racing `take` on the same element fails rather than double-delivers).

use clusterlib_core::key::NotifyableKey;
use clusterlib_repository::{CreateFlags, Repository, RepositoryError};

pub struct Queue {
    key: NotifyableKey,
}

impl Queue {
    pub fn new(key: NotifyableKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &NotifyableKey {
        &self.key
    }

    /// Appends `element` as a new sequential child; returns the full path
    /// of the created node.
    pub async fn put(&self, repo: &dyn Repository, element: &[u8]) -> Result<String, RepositoryError> {
        let prefix = format!("{}/entry_", self.key);
        repo.create_node(&prefix, element, CreateFlags::SEQUENCE).await
    }

    /// Reads and removes the lowest-sequence child, if any. Returns `None`
    /// when the queue is empty, and retries internally if another consumer
    /// wins the race to delete the element this call selected.
    pub async fn take(&self, repo: &dyn Repository) -> Result<Option<Vec<u8>>, RepositoryError> {
        loop {
            let mut children = repo.get_node_children(self.key.as_str(), None).await?;
            children.sort();
            let Some(lowest) = children.into_iter().next() else {
                return Ok(None);
            };
            let path = format!("{}/{lowest}", self.key);
            let (data, stat) = match repo.get_node_data(&path, None).await {
                Ok(v) => v,
                Err(RepositoryError::NoNode(_)) => continue,
                Err(e) => return Err(e),
            };
            match repo.delete_node(&path, false, Some(stat.version)).await {
                Ok(true) => return Ok(Some(data)),
                Ok(false) => continue,
                Err(RepositoryError::BadVersion { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn size(&self, repo: &dyn Repository) -> Result<usize, RepositoryError> {
        Ok(repo.get_node_children(self.key.as_str(), None).await?.len())
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
