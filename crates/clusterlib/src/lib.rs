// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The clusterlib facade: the `Factory`, the dispatch engine, per-client
//! event delivery, the Server facet, and the typed Notifyable handles
//! applications actually construct.

pub mod client;
pub mod dispatch;
pub mod factory;
pub mod notifyable_api;
pub mod server;

pub use client::{Client, ClientPayload, UserEventHandler};
pub use factory::Factory;
pub use notifyable_api::{
    Application, ClusterObject, ComputeNode, DataDistributionHandle, Group, LeadershipBid,
    PropertyListHandle, ProcessSlotHandle, Queue, Root,
};
pub use server::{HealthCheck, HealthStatus, Server};
