// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PropertyList` (spec §4.12): an ordered key→value map, edited in memory
//! and sent to the backend as a whole on `publish`. Grounded on the same
//! optimistic-CAS discipline `clusterlib-dist`'s `DataDistribution` uses,
//! here at the granularity of one `keyVal` attribute leaf instead of a
//! `shards`/`manualOverrides` pair.

use indexmap::IndexMap;

use clusterlib_core::key::NotifyableKey;
use clusterlib_repository::{NodeStat, Repository, RepositoryError};
use clusterlib_wire::property_list::{marshal, unmarshal};
use clusterlib_wire::WireError;

const KEY_VAL_LEAF: &str = "keyVal";

fn key_val_path(key: &NotifyableKey) -> String {
    format!("{key}/{KEY_VAL_LEAF}")
}

/// In-memory working copy of a PropertyList, plus the version it was last
/// published or refreshed at. `set`/`erase` only touch the local copy;
/// `publish` is the sole path to the backend.
pub struct PropertyList {
    key: NotifyableKey,
    entries: IndexMap<String, String>,
    version: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum PropertyListError {
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// `publish` lost a version race; the caller must `refresh` and retry.
    #[error("publish conflict: local version {local} does not match backend")]
    Conflict { local: i64 },
}

impl PropertyList {
    pub fn new(key: NotifyableKey) -> Self {
        Self { key, entries: IndexMap::new(), version: 0 }
    }

    pub fn key(&self) -> &NotifyableKey {
        &self.key
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.entries
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn erase(&mut self, name: &str) -> bool {
        self.entries.shift_remove(name).is_some()
    }

    /// Loads the backend's current value and version, discarding any
    /// unpublished local edits. Call this after a `Conflict` before
    /// retrying `publish`.
    pub async fn refresh(&mut self, repo: &dyn Repository) -> Result<(), PropertyListError> {
        match repo.get_node_data(&key_val_path(&self.key), None).await {
            Ok((data, stat)) => {
                let wire = String::from_utf8_lossy(&data);
                self.entries = unmarshal(&wire)?;
                self.version = stat.version;
                Ok(())
            }
            Err(RepositoryError::NoNode(_)) => {
                self.entries = IndexMap::new();
                self.version = 0;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sends the marshalled in-memory map with the locally-held version.
    /// On success, adopts the backend's returned version. On a version
    /// mismatch, returns `Conflict` without mutating local state — the
    /// caller decides whether to `refresh` and retry (spec §4.12).
    pub async fn publish(&mut self, repo: &dyn Repository) -> Result<(), PropertyListError> {
        let wire = marshal(&self.entries)?;
        let path = key_val_path(&self.key);
        let result = repo.set_node_data(&path, wire.as_bytes(), self.version).await;
        match result {
            Ok(NodeStat { version }) => {
                self.version = version;
                Ok(())
            }
            Err(RepositoryError::BadVersion { .. }) => Err(PropertyListError::Conflict { local: self.version }),
            Err(RepositoryError::NoNode(_)) => {
                let created = repo
                    .create_node(&path, wire.as_bytes(), clusterlib_repository::CreateFlags::NONE)
                    .await;
                match created {
                    Ok(_) => {
                        self.version = 0;
                        Ok(())
                    }
                    Err(RepositoryError::NodeExists(_)) => Err(PropertyListError::Conflict { local: self.version }),
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "property_list_tests.rs"]
mod tests;
