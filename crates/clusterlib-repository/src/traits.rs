// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The abstract contract a coordination-service backend must provide
//! (spec §6). `async_trait` matches the pattern teacher uses for its
//! `AgentAdapter`/`NotifyAdapter`/`SessionAdapter` collaborator traits.

use async_trait::async_trait;

use crate::error::RepositoryError;

/// Flags passed to [`Repository::create_node`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateFlags {
    pub ephemeral: bool,
    pub sequence: bool,
}

impl CreateFlags {
    pub const NONE: Self = Self { ephemeral: false, sequence: false };
    pub const EPHEMERAL: Self = Self { ephemeral: true, sequence: false };
    pub const SEQUENCE: Self = Self { ephemeral: false, sequence: true };
    pub const EPHEMERAL_SEQUENCE: Self = Self { ephemeral: true, sequence: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStat {
    pub version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryEventKind {
    Created,
    Deleted,
    Changed,
    Child,
    Session,
    NotWatching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Associating,
    Connected,
    ExpiredSession,
}

/// A single event delivered by the backend's watch stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryEvent {
    pub kind: RepositoryEventKind,
    pub path: String,
    pub session_state: Option<SessionState>,
}

/// A one-shot watch callback. The same callback type is used for `exists`,
/// `getNodeData`, and `getNodeChildren` watches — all one-shot per spec §6.
pub type WatchCallback = std::sync::Arc<dyn Fn(RepositoryEvent) + Send + Sync>;

/// The only backend dependency clusterlib has. Errors distinguish
/// connection loss (`RepositoryError::ConnectionLost`) from all other
/// failures, per spec §6/§7.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_node(
        &self,
        path: &str,
        data: &[u8],
        flags: CreateFlags,
    ) -> Result<String, RepositoryError>;

    async fn delete_node(
        &self,
        path: &str,
        recursive: bool,
        version: Option<i64>,
    ) -> Result<bool, RepositoryError>;

    async fn exists(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> Result<bool, RepositoryError>;

    async fn get_node_data(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> Result<(Vec<u8>, NodeStat), RepositoryError>;

    async fn set_node_data(
        &self,
        path: &str,
        data: &[u8],
        version: i64,
    ) -> Result<NodeStat, RepositoryError>;

    async fn get_node_children(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> Result<Vec<String>, RepositoryError>;

    /// Completes by firing `watch` on `path` once every operation issued
    /// before this call has been applied by the backend.
    async fn sync(&self, path: &str, watch: WatchCallback) -> Result<(), RepositoryError>;
}
