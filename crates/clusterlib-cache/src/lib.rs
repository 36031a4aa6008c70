// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The Notifyable cache and the CachedObjectChangeHandlers table (spec
//! §4.4, §4.8): typed storage for the cluster's tagged-variant Notifyables,
//! and the per-attribute-kind handlers that turn one-shot backend watch
//! events into at-most-once semantic events.

pub mod cache;
pub mod handlers;
pub mod notifyable;

pub use cache::NotifyableCache;
pub use handlers::{
    AttributeChangeHandler, BackendAccess, BackendEventType, CachedObjectChangeHandler,
    HandlerKind, HandlerOutcome, HandlerTable, SemanticEvent,
};
pub use notifyable::{Notifyable, NotifyableState};
