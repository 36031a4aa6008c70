// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("malformed shard tuple: {0:?}")]
    MalformedShard(String),

    #[error("malformed override tuple: {0:?}")]
    MalformedOverride(String),

    #[error("malformed property-list entry: {0:?}")]
    MalformedProperty(String),

    #[error("shard bound is not a valid u64: {0:?}")]
    InvalidHashBound(String),

    #[error("key or value contains the reserved separator {found:?}: {value:?}")]
    ReservedSeparator { value: String, found: char },
}
