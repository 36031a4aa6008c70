// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Factory/Client configuration.
//!
//! A plain struct threaded through constructors, the way teacher's
//! `RuntimeConfig` and `ContainerConfig` are — no global config singleton.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClusterlibConfig {
    /// Connection string handed to the `Repository` implementation
    /// (e.g. `"zk1:2181,zk2:2181"`). Opaque to clusterlib-core.
    pub repository_connect: String,
    /// Whether the repository wrapper retries once on transient
    /// connection loss before surfacing `RepositoryConnectionFailure`.
    pub reconnect_on_loss: bool,
    /// How long `Factory::synchronize` waits for the completion counter
    /// to reach the issued sync id before giving up.
    pub synchronize_timeout: Duration,
    /// Default polling period for the timer wheel's wakeup loop.
    pub timer_wheel_resolution: Duration,
    /// Health-checker sleep after a healthy tick.
    pub check_frequency_healthy: Duration,
    /// Health-checker sleep after an unhealthy tick.
    pub check_frequency_unhealthy: Duration,
}

impl Default for ClusterlibConfig {
    fn default() -> Self {
        Self {
            repository_connect: String::new(),
            reconnect_on_loss: true,
            synchronize_timeout: Duration::from_secs(30),
            timer_wheel_resolution: Duration::from_millis(100),
            check_frequency_healthy: Duration::from_secs(10),
            check_frequency_unhealthy: Duration::from_secs(2),
        }
    }
}

impl ClusterlibConfig {
    pub fn with_repository_connect(mut self, connect: impl Into<String>) -> Self {
        self.repository_connect = connect.into();
        self
    }

    pub fn with_reconnect_on_loss(mut self, reconnect: bool) -> Self {
        self.reconnect_on_loss = reconnect;
        self
    }

    pub fn with_synchronize_timeout(mut self, timeout: Duration) -> Self {
        self.synchronize_timeout = timeout;
        self
    }
}
