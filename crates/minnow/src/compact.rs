// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log compaction
//!
//! Compaction replays the whole log into a canonical mapping, rewrites
//! the log to exactly one `Put` per live key via the atomic replace, and
//! re-anchors the read cache to the result. Tombstones and superseded
//! values are discarded; a surviving key by definition has no tombstone
//! to re-persist.

use crate::cache::ReadCache;
use crate::error::StoreError;
use crate::log::AppendLog;
use crate::record::Record;
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of one compaction pass
#[derive(Debug, Clone)]
pub struct CompactionStats {
    /// Records replayed from the log
    pub records_before: usize,
    /// Live keys persisted back
    pub records_after: usize,
    /// Bytes reclaimed from the log file
    pub bytes_reclaimed: u64,
}

/// Fold every record of the log, in order, into a canonical mapping.
///
/// A record that fails to decode aborts the fold: the log must never be
/// rewritten from a partial read.
pub(crate) fn replay(log: &AppendLog) -> Result<(BTreeMap<String, Value>, usize), StoreError> {
    let mut state = BTreeMap::new();
    let mut replayed = 0usize;

    for result in log.read_all()? {
        match result? {
            Record::Put { key, value } => {
                state.insert(key, value);
            }
            Record::Tombstone { key } => {
                state.remove(&key);
            }
        }
        replayed += 1;
    }

    Ok((state, replayed))
}

/// Run one compaction pass over `log`, re-anchoring `cache` on success.
///
/// If the replace fails partway the rename never happened and the
/// original log is untouched; the cycle is merely a missed
/// space-reclamation opportunity.
pub(crate) fn compact(
    log: &mut AppendLog,
    cache: &mut ReadCache,
) -> Result<CompactionStats, StoreError> {
    let old_len = log.len_bytes()?;
    let (state, records_before) = replay(log)?;

    let records: Vec<Record> = state
        .iter()
        .map(|(key, value)| Record::put(key.clone(), value.clone()))
        .collect();
    let new_len = log.replace_with(&records)?;

    let records_after = records.len();
    cache.replace_all(state);

    let bytes_reclaimed = old_len.saturating_sub(new_len);
    tracing::info!(records_before, records_after, bytes_reclaimed, "log compacted");

    Ok(CompactionStats {
        records_before,
        records_after,
        bytes_reclaimed,
    })
}

#[cfg(test)]
#[path = "compact_tests.rs"]
mod tests;
