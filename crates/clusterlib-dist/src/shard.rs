// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// `[begin, end]` inclusive hash range bound to a target Notifyable — a
/// node or another DataDistribution being forwarded to, identified the
/// same way the wire form addresses it: by app/group/node triple rather
/// than a single opaque key. Shards are consulted in insertion order at
/// lookup time (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub begin: u64,
    pub end: u64,
    pub app: String,
    pub group: String,
    pub node: String,
    pub priority: i32,
}

impl Shard {
    pub fn new(
        begin: u64,
        end: u64,
        app: impl Into<String>,
        group: impl Into<String>,
        node: impl Into<String>,
        priority: i32,
    ) -> Self {
        Self { begin, end, app: app.into(), group: group.into(), node: node.into(), priority }
    }

    pub fn covers(&self, hash: u64) -> bool {
        self.begin <= hash && hash <= self.end
    }
}

/// A regex pattern bound to a target; consulted before hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualOverride {
    pub pattern: String,
    pub app: String,
    pub group: String,
    pub node: String,
}

impl ManualOverride {
    pub fn new(
        pattern: impl Into<String>,
        app: impl Into<String>,
        group: impl Into<String>,
        node: impl Into<String>,
    ) -> Self {
        Self { pattern: pattern.into(), app: app.into(), group: group.into(), node: node.into() }
    }
}
