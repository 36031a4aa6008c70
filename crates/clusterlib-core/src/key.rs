// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure functions over the hierarchical key-space grammar.
//!
//! `/clusterlib/<version>/root/applications/<app>/[groups/<g>/]*[nodes/<n>|
//! distributions/<d>|propertyLists/<p>|queues/<q>|processSlots/<s>]`
//!
//! No structural state lives here — only string composition and parsing, the
//! way `NotifyableKeyManipulator` in the original system held no state of its
//! own either.

use std::fmt;

pub const CLUSTERLIB_VERSION: &str = "1.0";
const SEP: char = '/';

const ROOT: &str = "root";
const APPLICATIONS: &str = "applications";
const GROUPS: &str = "groups";
const NODES: &str = "nodes";
const DISTRIBUTIONS: &str = "distributions";
const PROPERTY_LISTS: &str = "propertyLists";
const QUEUES: &str = "queues";
const PROCESS_SLOTS: &str = "processSlots";
const LOCKS: &str = "locks";
const BIDS: &str = "bids";

/// A fully-qualified Notifyable key. Cheap to clone; the coordination
/// service's address space is the identity, so unlike teacher's generated
/// `IdBuf` ids, this just wraps the path string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotifyableKey(String);

impl NotifyableKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Key of the lock directory for this Notifyable (used as a parent
    /// under which child Notifyables bid for the distributed lock).
    pub fn lock_dir_key(&self) -> NotifyableKey {
        NotifyableKey(format!("{}{SEP}{LOCKS}", self.0))
    }

    /// Key prefix under which sequential ephemeral lock-bid children are
    /// created.
    pub fn lock_node_key(&self) -> NotifyableKey {
        NotifyableKey(format!("{}{SEP}{LOCKS}{SEP}bid_", self.0))
    }

    /// Key prefix under which leader-election bids are created for a Group.
    pub fn leader_bid_dir_key(&self) -> NotifyableKey {
        NotifyableKey(format!("{}{SEP}{BIDS}", self.0))
    }

    pub fn current_leader_key(&self) -> NotifyableKey {
        NotifyableKey(format!("{}{SEP}currentLeader", self.0))
    }
}

impl fmt::Display for NotifyableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NotifyableKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NotifyableKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Discriminates the variant of a parsed Notifyable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyableKind {
    Root,
    Application,
    Group,
    Node,
    DataDistribution,
    PropertyList,
    Queue,
    ProcessSlot,
}

/// Result of [`parse_key`]: the kind plus the parent key and leaf name,
/// borrowed from the input so parsing stays allocation-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey<'a> {
    pub kind: NotifyableKind,
    pub parent: Option<&'a str>,
    pub name: &'a str,
}

pub fn root_key() -> NotifyableKey {
    NotifyableKey(format!("/clusterlib/{CLUSTERLIB_VERSION}/{ROOT}"))
}

pub fn compose_app_key(name: &str) -> NotifyableKey {
    NotifyableKey(format!("{}{SEP}{APPLICATIONS}{SEP}{name}", root_key()))
}

pub fn compose_group_key(parent: &NotifyableKey, name: &str) -> NotifyableKey {
    NotifyableKey(format!("{parent}{SEP}{GROUPS}{SEP}{name}"))
}

pub fn compose_node_key(parent: &NotifyableKey, name: &str) -> NotifyableKey {
    NotifyableKey(format!("{parent}{SEP}{NODES}{SEP}{name}"))
}

pub fn compose_dist_key(parent: &NotifyableKey, name: &str) -> NotifyableKey {
    NotifyableKey(format!("{parent}{SEP}{DISTRIBUTIONS}{SEP}{name}"))
}

pub fn compose_property_list_key(parent: &NotifyableKey, name: &str) -> NotifyableKey {
    NotifyableKey(format!("{parent}{SEP}{PROPERTY_LISTS}{SEP}{name}"))
}

pub fn compose_queue_key(parent: &NotifyableKey, name: &str) -> NotifyableKey {
    NotifyableKey(format!("{parent}{SEP}{QUEUES}{SEP}{name}"))
}

pub fn compose_process_slot_key(parent: &NotifyableKey, name: &str) -> NotifyableKey {
    NotifyableKey(format!("{parent}{SEP}{PROCESS_SLOTS}{SEP}{name}"))
}

/// Parse a key into its kind, parent, and leaf name.
///
/// Returns `None` for malformed keys (not rooted at the clusterlib prefix,
/// or an odd/unknown path shape).
pub fn parse_key(key: &str) -> Option<ParsedKey<'_>> {
    let prefix = format!("/clusterlib/{CLUSTERLIB_VERSION}/{ROOT}");
    if key == prefix {
        return Some(ParsedKey { kind: NotifyableKind::Root, parent: None, name: ROOT });
    }
    let rest = key.strip_prefix(&prefix)?.strip_prefix(SEP)?;
    let segments: Vec<&str> = rest.split(SEP).collect();

    // segments must alternate [typeword, name]*, starting with "applications"
    if segments.len() < 2 || segments.len() % 2 != 0 || segments[0] != APPLICATIONS {
        return None;
    }

    let name = segments[segments.len() - 1];
    let kind = if segments.len() == 2 {
        NotifyableKind::Application
    } else {
        match segments[segments.len() - 2] {
            GROUPS => NotifyableKind::Group,
            NODES => NotifyableKind::Node,
            DISTRIBUTIONS => NotifyableKind::DataDistribution,
            PROPERTY_LISTS => NotifyableKind::PropertyList,
            QUEUES => NotifyableKind::Queue,
            PROCESS_SLOTS => NotifyableKind::ProcessSlot,
            _ => return None,
        }
    };

    let parent = if segments.len() == 2 {
        Some(prefix_static(key))
    } else {
        let head = &segments[..segments.len() - 2];
        let parent_rest_len: usize = head.iter().map(|s| s.len() + 1).sum();
        Some(&key[..prefix.len() + 1 + parent_rest_len - 1])
    };

    Some(ParsedKey { kind, parent, name })
}

/// Returns `&'static str`-shaped slice of the root key as borrowed from the
/// input when the input happens to start with it (always true here).
fn prefix_static(key: &str) -> &str {
    let prefix = format!("/clusterlib/{CLUSTERLIB_VERSION}/{ROOT}");
    &key[..prefix.len()]
}

/// Key of the parent Notifyable, computed purely from string structure
/// (used by `getMyParent` resolution without needing a loaded object).
pub fn parent_key(key: &str) -> Option<&str> {
    parse_key(key)?.parent
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
