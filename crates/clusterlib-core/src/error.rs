// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The clusterlib error taxonomy.
//!
//! Every fallible operation in the workspace returns `ClusterlibError` (or a
//! crate-local error that converts into it via `#[from]`). The variants
//! match the propagation policy of the original system: connection loss is
//! distinguished from "the backend said no", and programming-bug invariants
//! are never silently swallowed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterlibError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("method not permitted on this notifyable: {0}")]
    InvalidMethod(String),

    #[error("notifyable removed: {key}")]
    ObjectRemoved { key: String },

    #[error("repository connection lost")]
    RepositoryConnectionFailure,

    #[error("repository internal failure: {0}")]
    RepositoryInternalsFailure(String),

    #[error("versioned publish rejected, reload and retry: {key}")]
    PublishVersion { key: String },

    #[error("invariant violated ({tag}): {detail}")]
    InconsistentInternalState { tag: &'static str, detail: String },

    #[error("cluster error: {0}")]
    ClusterException(String),
}

impl ClusterlibError {
    pub fn invalid_method(what: impl Into<String>) -> Self {
        Self::InvalidMethod(what.into())
    }

    pub fn inconsistent(tag: &'static str, detail: impl Into<String>) -> Self {
        Self::InconsistentInternalState { tag, detail: detail.into() }
    }
}

pub type ClusterlibResult<T> = Result<T, ClusterlibError>;
