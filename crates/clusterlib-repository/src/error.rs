// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("session to the coordination service is lost")]
    ConnectionLost,

    #[error("node already exists: {0}")]
    NodeExists(String),

    #[error("node not found: {0}")]
    NoNode(String),

    #[error("version mismatch on {path}: expected {expected}, found {found}")]
    BadVersion { path: String, expected: i64, found: i64 },

    #[error("node has children, cannot delete non-recursively: {0}")]
    NotEmpty(String),

    #[error("internal backend error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for clusterlib_core::ClusterlibError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::ConnectionLost => clusterlib_core::ClusterlibError::RepositoryConnectionFailure,
            RepositoryError::BadVersion { path, .. } => {
                clusterlib_core::ClusterlibError::PublishVersion { key: path }
            }
            other => clusterlib_core::ClusterlibError::RepositoryInternalsFailure(other.to_string()),
        }
    }
}
