// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! PropertyList, Queue, and ProcessSlot (spec §3, §4.12, §14): the three
//! Notifyable kinds whose state lives in a single versioned backend value
//! rather than a handful of fixed attribute leaves.

pub mod process_slot;
pub mod property_list;
pub mod queue;

pub use process_slot::{CurrentProcessState, ProcessSlot};
pub use property_list::{PropertyList, PropertyListError};
pub use queue::Queue;
