// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire form for PropertyList: `k=v;` repeated, insertion order preserved.
//! No escaping is defined for `;` or `=` inside keys/values — per spec this
//! is a documented constraint, not a bug: `marshal` rejects such entries
//! rather than silently corrupting the wire form.

use indexmap::IndexMap;

use crate::error::WireError;

/// Marshal an ordered key/value map into the `k=v;k=v;` wire form.
pub fn marshal(entries: &IndexMap<String, String>) -> Result<String, WireError> {
    let mut out = String::new();
    for (key, value) in entries {
        for (s, ch) in [(key, ';'), (key, '='), (value, ';'), (value, '=')] {
            if s.contains(ch) {
                return Err(WireError::ReservedSeparator { value: s.clone(), found: ch });
            }
        }
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push(';');
    }
    Ok(out)
}

/// Unmarshal the `k=v;k=v;` wire form, preserving the order entries
/// appeared in the string.
pub fn unmarshal(wire: &str) -> Result<IndexMap<String, String>, WireError> {
    let mut entries = IndexMap::new();
    for chunk in wire.split(';').filter(|s| !s.is_empty()) {
        let (key, value) = chunk
            .split_once('=')
            .ok_or_else(|| WireError::MalformedProperty(chunk.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
    }
    Ok(entries)
}

#[cfg(test)]
#[path = "property_list_tests.rs"]
mod tests;
