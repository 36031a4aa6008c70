// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Server facet (spec §4.11): a [`Client`] bound to one
//! [`ComputeNode`], adding a health-checker task and thin wrappers around
//! the node's owning Group's leader election.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use clusterlib_core::ClusterlibResult;

use crate::client::Client;
use crate::factory::Factory;
use crate::notifyable_api::{ClusterObject, ComputeNode, Group, LeadershipBid};

/// Result of one health-check tick, written into the node's `clientState`
/// attribute (spec §4.11).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub description: String,
}

impl HealthStatus {
    pub fn healthy(description: impl Into<String>) -> Self {
        Self { healthy: true, description: description.into() }
    }

    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self { healthy: false, description: description.into() }
    }

    fn encode(&self) -> Vec<u8> {
        let tag = if self.healthy { "healthy" } else { "unhealthy" };
        format!("{tag}:{}", self.description).into_bytes()
    }
}

/// User-supplied liveness probe, invoked once per tick (spec §4.11).
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> HealthStatus;
}

/// A Server: the Node a process registers itself as, plus the health
/// checker and leader-election wrappers a long-running process needs on
/// top of the plain Notifyable capability set.
pub struct Server {
    node: ComputeNode,
    group: Group,
    factory: Arc<Factory>,
    client: Arc<Client>,
    health_check: Arc<dyn HealthCheck>,
    client_state_version: Mutex<i64>,
    leadership: Mutex<Option<LeadershipBid>>,
    checker_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Server {
    /// Binds a Server to `node`, whose nearest Group ancestor is where
    /// `try_to_become_leader`/`give_up_leadership` bid. Registers a fresh
    /// `Client` with the factory for event delivery, same as any other API
    /// consumer (spec §4.11's "a Server is a Client bound to one Node").
    pub fn new(node: ComputeNode, factory: Arc<Factory>, health_check: Arc<dyn HealthCheck>) -> ClusterlibResult<Arc<Self>> {
        let group = node.get_my_group().ok_or_else(|| {
            clusterlib_core::ClusterlibError::invalid_method("a Server's Node must be nested under a Group")
        })?;
        let group = Group::from_notifyable(group, factory.clone());
        let client = factory.new_client();
        Ok(Arc::new(Self {
            node,
            group,
            factory,
            client,
            health_check,
            client_state_version: Mutex::new(0),
            leadership: Mutex::new(None),
            checker_task: Mutex::new(None),
        }))
    }

    pub fn node(&self) -> &ComputeNode {
        &self.node
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Spawns the health-checker task (spec §4.11): tick, publish the
    /// result into `clientState`, then sleep `checkFrequencyHealthy` on
    /// success or `checkFrequencyUnhealthy` on failure before the next
    /// tick.
    pub async fn start_health_checker(self: &Arc<Self>) {
        let mut slot = self.checker_task.lock().await;
        if slot.is_some() {
            return;
        }
        let server = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            loop {
                let status = server.health_check.check().await;
                let healthy = status.healthy;
                if let Err(e) = server.publish_client_state(&status).await {
                    tracing::warn!(error = %e, "failed to publish clientState");
                }
                let sleep_for = if healthy {
                    server.factory.config().check_frequency_healthy
                } else {
                    server.factory.config().check_frequency_unhealthy
                };
                tokio::time::sleep(sleep_for).await;
            }
        }));
    }

    /// Stops the health-checker task, if running. Cooperative shutdown is
    /// not meaningful here since the loop only ever sleeps or awaits the
    /// health check itself; aborting is safe between ticks.
    pub async fn stop_health_checker(&self) {
        if let Some(task) = self.checker_task.lock().await.take() {
            task.abort();
        }
    }

    async fn publish_client_state(&self, status: &HealthStatus) -> ClusterlibResult<()> {
        let path = format!("{}/clientState", self.node.key());
        let mut version = self.client_state_version.lock().await;
        let new_version =
            crate::notifyable_api::publish_versioned(self.factory.repo(), &path, &status.encode(), *version).await?;
        *version = new_version;
        Ok(())
    }

    /// Bids for leadership of this Server's Group (spec §4.11), blocking
    /// until the bid wins. A Server already holding a bid is a no-op.
    pub async fn try_to_become_leader(&self) -> ClusterlibResult<()> {
        let mut leadership = self.leadership.lock().await;
        if leadership.is_some() {
            return Ok(());
        }
        let bid = self.group.bid_for_leadership().await?;
        *leadership = Some(bid);
        Ok(())
    }

    pub async fn am_i_the_leader(&self) -> bool {
        self.leadership.lock().await.is_some()
    }

    /// Gives up leadership, if held. A Server that never bid is a no-op.
    pub async fn give_up_leadership(&self) -> ClusterlibResult<()> {
        let mut leadership = self.leadership.lock().await;
        if let Some(bid) = leadership.take() {
            bid.abdicate().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
