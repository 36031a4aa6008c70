// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `DataDistribution`: in-memory shard/override resolution (spec §4.7).
//! This crate stays backend-agnostic — staging shards/overrides and
//! resolving lookups against them is all pure computation here; the
//! versioned CAS publish against the Repository lives one layer up, in
//! the `clusterlib` crate, which calls [`DataDistribution::to_wire_shards`]
//! / [`DataDistribution::to_wire_overrides`] and records the resulting
//! backend version back with [`DataDistribution::record_shards_version`]
//! / [`DataDistribution::record_overrides_version`].

use regex::Regex;

use clusterlib_wire::{distribution as wire, OverrideEntry, ShardEntry, WireError};

use crate::hash::HashFunctionIndex;
use crate::shard::{ManualOverride, Shard};

/// Target address of a shard or override resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub app: String,
    pub group: String,
    pub node: String,
}

pub struct DataDistribution {
    shards: Vec<Shard>,
    overrides: Vec<ManualOverride>,
    hash_function: HashFunctionIndex,
    shards_version: i64,
    overrides_version: i64,
}

impl DataDistribution {
    pub fn new(hash_function: HashFunctionIndex) -> Self {
        Self { shards: Vec::new(), overrides: Vec::new(), hash_function, shards_version: -1, overrides_version: -1 }
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    pub fn overrides(&self) -> &[ManualOverride] {
        &self.overrides
    }

    pub fn shards_version(&self) -> i64 {
        self.shards_version
    }

    pub fn overrides_version(&self) -> i64 {
        self.overrides_version
    }

    pub fn set_shards(&mut self, shards: Vec<Shard>) {
        self.shards = shards;
    }

    pub fn set_overrides(&mut self, overrides: Vec<ManualOverride>) {
        self.overrides = overrides;
    }

    pub fn record_shards_version(&mut self, version: i64) {
        self.shards_version = version;
    }

    pub fn record_overrides_version(&mut self, version: i64) {
        self.overrides_version = version;
    }

    /// Step 1: scan override patterns in insertion order, first match wins.
    /// Step 2: else hash the key and walk shards in insertion order.
    /// Step 4: `None` if nothing matches.
    pub fn find_covering_node(&self, key: &str) -> Option<ResolvedTarget> {
        for over in &self.overrides {
            // A malformed pattern can never have been accepted by
            // `set_overrides` in well-formed use; skip rather than panic.
            let Ok(re) = Regex::new(&over.pattern) else { continue };
            if re.is_match(key) {
                return Some(ResolvedTarget {
                    app: over.app.clone(),
                    group: over.group.clone(),
                    node: over.node.clone(),
                });
            }
        }

        let hash = self.hash_function.hash(key);
        self.shards.iter().find(|s| s.covers(hash)).map(|s| ResolvedTarget {
            app: s.app.clone(),
            group: s.group.clone(),
            node: s.node.clone(),
        })
    }

    /// True iff the union of `[begin,end]` shard ranges equals the
    /// hash function's full range (spec §4.7 assumes the full `u64` range).
    pub fn is_covered(&self) -> bool {
        if self.shards.is_empty() {
            return false;
        }
        let mut ranges: Vec<(u64, u64)> = self.shards.iter().map(|s| (s.begin, s.end)).collect();
        ranges.sort_unstable_by_key(|&(begin, _)| begin);

        // u128 sidesteps the u64::MAX + 1 overflow when checking whether
        // coverage reaches the very top of the range.
        let mut next_uncovered: u128 = 0;
        for (begin, end) in ranges {
            if begin as u128 > next_uncovered {
                return false;
            }
            next_uncovered = next_uncovered.max(end as u128 + 1);
        }
        next_uncovered > u64::MAX as u128
    }

    pub fn to_wire_shards(&self) -> Result<String, WireError> {
        let entries: Vec<ShardEntry> = self
            .shards
            .iter()
            .map(|s| ShardEntry {
                begin: s.begin,
                end: s.end,
                app: s.app.clone(),
                group: s.group.clone(),
                node: s.node.clone(),
            })
            .collect();
        wire::marshal_shards(&entries)
    }

    pub fn to_wire_overrides(&self) -> Result<String, WireError> {
        let entries: Vec<OverrideEntry> = self
            .overrides
            .iter()
            .map(|o| OverrideEntry {
                pattern: o.pattern.clone(),
                app: o.app.clone(),
                group: o.group.clone(),
                node: o.node.clone(),
            })
            .collect();
        wire::marshal_overrides(&entries)
    }

    pub fn load_wire_shards(&mut self, value: &str) -> Result<(), WireError> {
        let entries = wire::unmarshal_shards(value)?;
        self.shards = entries
            .into_iter()
            .map(|e| Shard::new(e.begin, e.end, e.app, e.group, e.node, 0))
            .collect();
        Ok(())
    }

    pub fn load_wire_overrides(&mut self, value: &str) -> Result<(), WireError> {
        let entries = wire::unmarshal_overrides(value)?;
        self.overrides = entries
            .into_iter()
            .map(|e| ManualOverride::new(e.pattern, e.app, e.group, e.node))
            .collect();
        Ok(())
    }
}

#[cfg(test)]
#[path = "distribution_tests.rs"]
mod tests;
