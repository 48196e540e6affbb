// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! minnow: a small log-structured persistent key-value store
//!
//! This crate provides:
//! - An append-only JSON-lines log as the durable source of truth
//! - Client-side write batching with a configurable batch size
//! - An in-memory read cache that reflects every accepted write,
//!   flushed or not
//! - Periodic compaction that collapses the log to one record per
//!   live key
//!
//! ```
//! use minnow::Store;
//!
//! let store = Store::open_temp()?;
//! store.set("greeting", &"hello")?;
//! assert_eq!(store.get("greeting"), Some(serde_json::json!("hello")));
//! store.flush()?;
//! # Ok::<(), minnow::StoreError>(())
//! ```

pub mod buffer;
pub mod cache;
pub mod compact;
pub mod config;
pub mod error;
pub mod log;
pub mod record;
pub mod store;

// Re-exports
pub use compact::CompactionStats;
pub use config::StoreConfig;
pub use error::StoreError;
pub use record::{Record, TOMBSTONE_MARKER};
pub use store::Store;
