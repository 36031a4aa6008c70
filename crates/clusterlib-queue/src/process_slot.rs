// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ProcessSlot` (spec.md §3, §14): the data object a process-supervisor
//! reads and writes through the same `keyVal`-leaf, versioned get/set/
//! publish discipline as [`crate::property_list::PropertyList`]. Launching
//! or monitoring the OS process itself is out of scope (spec.md §1
//! Non-goals) — this type only carries the state an external supervisor
//! would coordinate through.

use indexmap::IndexMap;

use clusterlib_core::key::NotifyableKey;
use clusterlib_repository::Repository;
use clusterlib_wire::property_list::{marshal, unmarshal};

use crate::property_list::PropertyListError;

/// Lifecycle state of the process a slot describes (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentProcessState {
    Unused,
    Started,
    Running,
    Stopped,
    Finished,
    Failed,
    Invalid,
}

impl CurrentProcessState {
    fn as_wire(self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Started => "started",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Invalid => "invalid",
        }
    }

    fn from_wire(s: &str) -> Self {
        match s {
            "started" => Self::Started,
            "running" => Self::Running,
            "stopped" => Self::Stopped,
            "finished" => Self::Finished,
            "failed" => Self::Failed,
            "unused" => Self::Unused,
            _ => Self::Invalid,
        }
    }
}

const FIELD_STATE: &str = "state";
const FIELD_EXEC_ARGS: &str = "execArgs";
const FIELD_PORTS: &str = "ports";
const FIELD_PID: &str = "pid";
const FIELD_RESERVATION: &str = "reservationName";

/// Fields of a managed process slot. Exec args and ports are stored as a
/// single comma-joined field each, the same tuple-joining idiom
/// `clusterlib-wire::distribution` uses for shard/override fields.
pub struct ProcessSlot {
    key: NotifyableKey,
    state: CurrentProcessState,
    exec_args: Vec<String>,
    ports: Vec<u16>,
    pid: Option<u32>,
    reservation_name: Option<String>,
    version: i64,
}

impl ProcessSlot {
    pub fn new(key: NotifyableKey) -> Self {
        Self {
            key,
            state: CurrentProcessState::Unused,
            exec_args: Vec::new(),
            ports: Vec::new(),
            pid: None,
            reservation_name: None,
            version: 0,
        }
    }

    pub fn key(&self) -> &NotifyableKey {
        &self.key
    }

    pub fn state(&self) -> CurrentProcessState {
        self.state
    }

    pub fn set_state(&mut self, state: CurrentProcessState) {
        self.state = state;
    }

    pub fn exec_args(&self) -> &[String] {
        &self.exec_args
    }

    pub fn set_exec_args(&mut self, args: Vec<String>) {
        self.exec_args = args;
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn set_ports(&mut self, ports: Vec<u16>) {
        self.ports = ports;
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn set_pid(&mut self, pid: Option<u32>) {
        self.pid = pid;
    }

    pub fn reservation_name(&self) -> Option<&str> {
        self.reservation_name.as_deref()
    }

    pub fn set_reservation_name(&mut self, name: Option<String>) {
        self.reservation_name = name;
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    fn to_entries(&self) -> IndexMap<String, String> {
        let mut entries = IndexMap::new();
        entries.insert(FIELD_STATE.to_string(), self.state.as_wire().to_string());
        entries.insert(FIELD_EXEC_ARGS.to_string(), self.exec_args.join(","));
        entries.insert(FIELD_PORTS.to_string(), self.ports.iter().map(u16::to_string).collect::<Vec<_>>().join(","));
        if let Some(pid) = self.pid {
            entries.insert(FIELD_PID.to_string(), pid.to_string());
        }
        if let Some(name) = &self.reservation_name {
            entries.insert(FIELD_RESERVATION.to_string(), name.clone());
        }
        entries
    }

    fn from_entries(&mut self, entries: &IndexMap<String, String>) {
        self.state = entries.get(FIELD_STATE).map(|s| CurrentProcessState::from_wire(s)).unwrap_or(CurrentProcessState::Unused);
        self.exec_args = entries
            .get(FIELD_EXEC_ARGS)
            .map(|s| s.split(',').filter(|p| !p.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();
        self.ports = entries
            .get(FIELD_PORTS)
            .map(|s| s.split(',').filter_map(|p| p.parse().ok()).collect())
            .unwrap_or_default();
        self.pid = entries.get(FIELD_PID).and_then(|s| s.parse().ok());
        self.reservation_name = entries.get(FIELD_RESERVATION).cloned();
    }

    fn key_val_path(&self) -> String {
        format!("{}/keyVal", self.key)
    }

    pub async fn refresh(&mut self, repo: &dyn Repository) -> Result<(), PropertyListError> {
        match repo.get_node_data(&self.key_val_path(), None).await {
            Ok((data, stat)) => {
                let wire = String::from_utf8_lossy(&data);
                let entries = unmarshal(&wire)?;
                self.from_entries(&entries);
                self.version = stat.version;
                Ok(())
            }
            Err(clusterlib_repository::RepositoryError::NoNode(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn publish(&mut self, repo: &dyn Repository) -> Result<(), PropertyListError> {
        let wire = marshal(&self.to_entries())?;
        let path = self.key_val_path();
        match repo.set_node_data(&path, wire.as_bytes(), self.version).await {
            Ok(stat) => {
                self.version = stat.version;
                Ok(())
            }
            Err(clusterlib_repository::RepositoryError::BadVersion { .. }) => {
                Err(PropertyListError::Conflict { local: self.version })
            }
            Err(clusterlib_repository::RepositoryError::NoNode(_)) => {
                match repo.create_node(&path, wire.as_bytes(), clusterlib_repository::CreateFlags::NONE).await {
                    Ok(_) => {
                        self.version = 0;
                        Ok(())
                    }
                    Err(clusterlib_repository::RepositoryError::NodeExists(_)) => {
                        Err(PropertyListError::Conflict { local: self.version })
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "process_slot_tests.rs"]
mod tests;
