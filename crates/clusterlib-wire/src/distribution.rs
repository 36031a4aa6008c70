// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire form for DataDistribution: a `shards\nmanualOverrides` top-level
//! split, each half a `;`-terminated list of `,`-separated tuples — shard
//! tuples are `begin,end,app,group,node`, override tuples are
//! `pattern,app,group,node`. As with the PropertyList form, no escaping is
//! defined for `,`/`;` inside a field; callers must not pass such names.

use crate::error::WireError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardEntry {
    pub begin: u64,
    pub end: u64,
    pub app: String,
    pub group: String,
    pub node: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideEntry {
    pub pattern: String,
    pub app: String,
    pub group: String,
    pub node: String,
}

fn check_field(value: &str) -> Result<(), WireError> {
    for ch in [',', ';'] {
        if value.contains(ch) {
            return Err(WireError::ReservedSeparator { value: value.to_string(), found: ch });
        }
    }
    Ok(())
}

pub fn marshal_shards(shards: &[ShardEntry]) -> Result<String, WireError> {
    let mut out = String::new();
    for shard in shards {
        for field in [&shard.app, &shard.group, &shard.node] {
            check_field(field)?;
        }
        out.push_str(&format!(
            "{},{},{},{},{};",
            shard.begin, shard.end, shard.app, shard.group, shard.node
        ));
    }
    Ok(out)
}

pub fn unmarshal_shards(wire: &str) -> Result<Vec<ShardEntry>, WireError> {
    wire.split(';')
        .filter(|s| !s.is_empty())
        .map(|tuple| {
            let fields: Vec<&str> = tuple.split(',').collect();
            let [begin, end, app, group, node] = fields[..] else {
                return Err(WireError::MalformedShard(tuple.to_string()));
            };
            let begin = begin
                .parse()
                .map_err(|_| WireError::InvalidHashBound(begin.to_string()))?;
            let end = end.parse().map_err(|_| WireError::InvalidHashBound(end.to_string()))?;
            Ok(ShardEntry {
                begin,
                end,
                app: app.to_string(),
                group: group.to_string(),
                node: node.to_string(),
            })
        })
        .collect()
}

pub fn marshal_overrides(overrides: &[OverrideEntry]) -> Result<String, WireError> {
    let mut out = String::new();
    for over in overrides {
        for field in [&over.pattern, &over.app, &over.group, &over.node] {
            check_field(field)?;
        }
        out.push_str(&format!(
            "{},{},{},{};",
            over.pattern, over.app, over.group, over.node
        ));
    }
    Ok(out)
}

pub fn unmarshal_overrides(wire: &str) -> Result<Vec<OverrideEntry>, WireError> {
    wire.split(';')
        .filter(|s| !s.is_empty())
        .map(|tuple| {
            let fields: Vec<&str> = tuple.split(',').collect();
            let [pattern, app, group, node] = fields[..] else {
                return Err(WireError::MalformedOverride(tuple.to_string()));
            };
            Ok(OverrideEntry {
                pattern: pattern.to_string(),
                app: app.to_string(),
                group: group.to_string(),
                node: node.to_string(),
            })
        })
        .collect()
}

/// Combine a distribution's shards and overrides into the `shards\n
/// manualOverrides` top-level form stored at a single node.
pub fn marshal_distribution(
    shards: &[ShardEntry],
    overrides: &[OverrideEntry],
) -> Result<String, WireError> {
    Ok(format!("{}\n{}", marshal_shards(shards)?, marshal_overrides(overrides)?))
}

pub fn unmarshal_distribution(
    wire: &str,
) -> Result<(Vec<ShardEntry>, Vec<OverrideEntry>), WireError> {
    let (shards_part, overrides_part) = wire.split_once('\n').unwrap_or((wire, ""));
    Ok((unmarshal_shards(shards_part)?, unmarshal_overrides(overrides_part)?))
}

#[cfg(test)]
#[path = "distribution_tests.rs"]
mod tests;
