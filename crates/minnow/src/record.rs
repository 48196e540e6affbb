// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutation records and their line codec
//!
//! Every change to the store is one immutable record, encoded as a
//! single-entry JSON object on its own log line: `{"<key>": <value>}`
//! asserts a value, `{"__remove__": "<key>"}` asserts a deletion.

use crate::error::StoreError;
use serde_json::{Map, Value};

/// Reserved field name that marks a record as a deletion.
///
/// Reserving it is what keeps decoding unambiguous: a `Put` under this
/// key has no encodable form and is rejected at the API edge.
pub const TOMBSTONE_MARKER: &str = "__remove__";

/// A single logged mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// As of this record, `key` maps to `value`
    Put { key: String, value: Value },
    /// As of this record, `key` is absent
    Tombstone { key: String },
}

impl Record {
    pub fn put(key: impl Into<String>, value: Value) -> Self {
        Record::Put {
            key: key.into(),
            value,
        }
    }

    pub fn tombstone(key: impl Into<String>) -> Self {
        Record::Tombstone { key: key.into() }
    }

    /// The key this record asserts about
    pub fn key(&self) -> &str {
        match self {
            Record::Put { key, .. } => key,
            Record::Tombstone { key } => key,
        }
    }

    /// Serialize to one line of JSON (no trailing newline).
    ///
    /// `serde_json` escapes control characters inside strings, so the
    /// output is self-delimited: one encoded record never spans lines.
    pub fn to_line(&self) -> Result<String, StoreError> {
        let mut object = Map::with_capacity(1);
        match self {
            Record::Put { key, value } => {
                if key == TOMBSTONE_MARKER {
                    return Err(StoreError::ReservedKey(key.clone()));
                }
                object.insert(key.clone(), value.clone());
            }
            Record::Tombstone { key } => {
                object.insert(TOMBSTONE_MARKER.to_string(), Value::String(key.clone()));
            }
        }
        Ok(serde_json::to_string(&Value::Object(object))?)
    }

    /// Parse from a single line of JSON.
    ///
    /// Decode failures are `CorruptRecord` with a zero line number; the
    /// log reader rewrites it with the actual position.
    pub fn from_line(line: &str) -> Result<Self, StoreError> {
        let value: Value = serde_json::from_str(line).map_err(|e| corrupt(e.to_string()))?;
        let Value::Object(object) = value else {
            return Err(corrupt("record is not a JSON object"));
        };

        let mut fields = object.into_iter();
        let (field, value) = match (fields.next(), fields.next()) {
            (Some(entry), None) => entry,
            _ => return Err(corrupt("record must contain exactly one field")),
        };

        if field == TOMBSTONE_MARKER {
            match value {
                Value::String(key) => Ok(Record::Tombstone { key }),
                _ => Err(corrupt("tombstone key is not a string")),
            }
        } else {
            Ok(Record::Put { key: field, value })
        }
    }
}

fn corrupt(reason: impl Into<String>) -> StoreError {
    StoreError::CorruptRecord {
        line: 0,
        reason: reason.into(),
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
