// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Distributed locking and leader election (spec §4.5, §4.6): both built
//! on the same sequential-ephemeral-bid primitive over a [`Repository`],
//! differing only in namespace and in what the lowest bidder publishes.

pub mod dlock;
pub mod election;

pub use dlock::DistributedLocks;
pub use election::{LeaderElection, LeadershipStatus};
