// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for codec, log, and store operations

use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A log line failed to decode. `line` is 1-based; it is 0 until the
    /// log reader fills in the position of the failing line.
    #[error("corrupted record at line {line}: {reason}")]
    CorruptRecord { line: u64, reason: String },
    /// The key collides with the tombstone marker and has no encodable form
    #[error("key is reserved for the tombstone marker: {0:?}")]
    ReservedKey(String),
}
