// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The `Repository` contract (spec §6) and an in-memory fake.
//!
//! The real coordination-service backend is out of scope (spec §1): this
//! crate only defines the abstract interface the rest of clusterlib is
//! written against, plus `InMemoryRepository`, a fake sufficient to drive
//! the whole stack in tests — the same role teacher's `oj-adapters`
//! `test-support`/`FakeAdapter` feature plays for its external
//! collaborators.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::RepositoryError;
pub use memory::InMemoryRepository;
pub use traits::{
    CreateFlags, NodeStat, Repository, RepositoryEvent, RepositoryEventKind, SessionState,
    WatchCallback,
};
