// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store facade
//!
//! Coordinates the write buffer, read cache, append log, and compactor
//! under one mutual-exclusion guard per store instance. Operations that
//! complete are totally ordered by guard acquisition; the log after
//! operation *k* is always the fold of exactly the first *k* accepted
//! mutations.

use crate::buffer::WriteBuffer;
use crate::cache::ReadCache;
use crate::compact::{self, CompactionStats};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::log::AppendLog;
use crate::record::{Record, TOMBSTONE_MARKER};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Batched, log-structured key-value store.
///
/// Writes are buffered in memory and appended to the log in batches;
/// reads are served from an in-memory cache that reflects every accepted
/// write, flushed or not. Wrap in `Arc` to share across threads; all
/// public operations serialize through one internal mutex.
pub struct Store {
    path: PathBuf,
    config: StoreConfig,
    inner: Mutex<Inner>,
}

struct Inner {
    log: AppendLog,
    buffer: WriteBuffer,
    cache: ReadCache,
    /// Flushes since the last compaction
    flushes: u64,
}

impl Store {
    /// Open or create a store backed by the log file at `path`.
    ///
    /// Replays the existing log into the read cache. Replay stops at the
    /// first record that fails to decode and keeps the valid prefix; use
    /// [`Store::repair`] to truncate a log torn by a crash.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let log = AppendLog::open(&path)?;

        let mut cache = ReadCache::new();
        for result in log.read_all()? {
            match result {
                Ok(Record::Put { key, value }) => cache.put(key, value),
                Ok(Record::Tombstone { key }) => {
                    cache.remove(&key);
                }
                Err(e) => {
                    tracing::warn!(?e, "stopping log replay at undecodable record");
                    break;
                }
            }
        }

        Ok(Self {
            path,
            config,
            inner: Mutex::new(Inner {
                log,
                buffer: WriteBuffer::new(),
                cache,
                flushes: 0,
            }),
        })
    }

    /// Open with default configuration
    pub fn open_default(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open(path, StoreConfig::default())
    }

    /// Create a store on a fresh log file in a temporary directory (for testing)
    pub fn open_temp() -> Result<Self, StoreError> {
        let dir = std::env::temp_dir().join(format!("minnow-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir)?;
        Self::open_default(dir.join("minnow.jsonl"))
    }

    /// Truncate the log at `path` after its last decodable record.
    ///
    /// Returns the number of bytes removed, or 0 if the log is clean.
    /// This is the explicit crash-recovery path: a normal `open` keeps
    /// the valid prefix but leaves the file untouched, and compaction
    /// refuses to run over a torn tail.
    pub fn repair(path: impl AsRef<Path>) -> Result<u64, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(0);
        }

        let log = AppendLog::open(path)?;
        let mut iter = log.read_all()?;
        let mut torn = false;
        while let Some(result) = iter.next() {
            if let Err(e) = result {
                tracing::warn!(?e, "log corruption found during repair");
                torn = true;
                break;
            }
        }

        if !torn {
            return Ok(0);
        }

        let valid_len = iter.valid_len();
        let file_len = std::fs::metadata(path)?.len();
        if valid_len >= file_len {
            return Ok(0);
        }

        let file = std::fs::OpenOptions::new().write(true).open(path)?;
        file.set_len(valid_len)?;
        file.sync_all()?;
        tracing::info!(
            removed = file_len - valid_len,
            "log truncated at corruption point"
        );
        Ok(file_len - valid_len)
    }

    /// Set a key to any serializable value.
    ///
    /// The write is immediately visible to [`Store::get`] and becomes
    /// durable on the next flush. When the buffer reaches the configured
    /// batch size the flush happens here and its result is returned; on
    /// a flush error the buffered records are retained for retry.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        if key == TOMBSTONE_MARKER {
            return Err(StoreError::ReservedKey(key.to_string()));
        }
        let value = serde_json::to_value(value)?;

        let mut inner = self.lock();
        inner.buffer.push(Record::put(key, value.clone()));
        inner.cache.put(key.to_string(), value);
        inner.flush_if_full(&self.config)
    }

    /// Get the current value for a key.
    ///
    /// Served entirely from the read cache; never touches the log.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().cache.get(key).cloned()
    }

    /// Get the current value for a key, deserialized into `T`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Remove a key, returning whether it was present.
    ///
    /// A tombstone is buffered either way, so an already-flushed value
    /// for the key cannot resurface on replay.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        inner.buffer.push(Record::tombstone(key));
        let existed = inner.cache.remove(key);
        inner.flush_if_full(&self.config)?;
        Ok(existed)
    }

    /// Whether a key is currently present
    pub fn contains(&self, key: &str) -> bool {
        self.lock().cache.contains(key)
    }

    /// All live keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.lock().cache.keys()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.lock().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cache.is_empty()
    }

    /// Flush buffered records to the log regardless of the batch size.
    ///
    /// Needed to force durability before shutdown. Flushing an empty
    /// buffer is a successful no-op and does not advance the compaction
    /// counter.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.lock().flush(&self.config)
    }

    /// Run a compaction pass now, regardless of the flush counter.
    ///
    /// Buffered records are flushed first so they cannot be dropped by
    /// the cache re-anchor.
    pub fn compact(&self) -> Result<CompactionStats, StoreError> {
        let mut guard = self.lock();
        guard.flush(&self.config)?;
        let inner = &mut *guard;
        let stats = compact::compact(&mut inner.log, &mut inner.cache)?;
        inner.flushes = 0;
        Ok(stats)
    }

    /// Drop every key: clears the buffer and the cache, replaces the log
    /// with the empty sequence, and resets the compaction counter.
    pub fn purge(&self) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.buffer.clear();
        inner.cache.clear();
        inner.log.replace_with(&[])?;
        inner.flushes = 0;
        Ok(())
    }

    /// Path of the backing log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicked writer must not wedge the store; the guard still
        // serializes access and the log invariant holds batch-wise.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    /// Drain the buffer into one durable append, then compact if the
    /// flush counter reached the configured interval.
    fn flush(&mut self, config: &StoreConfig) -> Result<(), StoreError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let batch = self.buffer.drain();
        if let Err(e) = self.log.append_batch(&batch) {
            // Nothing from a failed batch is durable; keep the records
            // so the caller can retry.
            self.buffer.restore(batch);
            return Err(e);
        }

        self.flushes += 1;
        if self.flushes >= config.compaction_interval {
            // Best-effort housekeeping: a failed pass leaves the log
            // valid, just unreduced. The cycle is consumed either way.
            if let Err(e) = compact::compact(&mut self.log, &mut self.cache) {
                tracing::warn!(?e, "compaction failed; log left unreduced");
            }
            self.flushes = 0;
        }

        Ok(())
    }

    fn flush_if_full(&mut self, config: &StoreConfig) -> Result<(), StoreError> {
        if self.buffer.len() >= config.batch_size {
            self.flush(config)
        } else {
            Ok(())
        }
    }
}

impl Drop for Store {
    /// Best-effort flush so buffered records survive scope exit
    fn drop(&mut self) {
        if !self.config.flush_on_drop {
            return;
        }
        let mut inner = self.lock();
        if let Err(e) = inner.flush(&self.config) {
            tracing::warn!(?e, "failed to flush buffered records on drop");
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
