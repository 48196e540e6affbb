// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durability and crash-safety behaviors

use crate::prelude::*;
use minnow::Store;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn last_completed_flush_survives_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let store = store_in(&dir, 2, 100);
        store.set("a", &1).unwrap();
        store.set("b", &2).unwrap();
        store.remove("a").unwrap();
        store.flush().unwrap();
    }

    let store = store_in(&dir, 2, 100);
    assert_eq!(store.get("a"), None);
    assert_eq!(store.get("b"), Some(json!(2)));
}

#[test]
fn scope_exit_flushes_buffered_writes() {
    let dir = TempDir::new().unwrap();

    {
        let store = store_in(&dir, 100, 100);
        store.set("buffered", &true).unwrap();
        // Dropped with a non-empty buffer; the store flushes on the way
        // out.
    }

    let store = store_in(&dir, 100, 100);
    assert_eq!(store.get("buffered"), Some(json!(true)));
}

#[test]
fn interrupted_replace_leaves_original_log_intact() {
    let dir = TempDir::new().unwrap();

    {
        let store = store_in(&dir, 2, 100);
        store.set("a", &1).unwrap();
        store.set("b", &2).unwrap();
    }
    let original = log_records(&log_path(&dir));

    // A crash between writing the temp file and the rename leaves a
    // stray sibling; the log itself must be untouched.
    let tmp = dir.path().join("minnow.jsonl.tmp");
    std::fs::write(&tmp, "{\"half\":").unwrap();

    let store = store_in(&dir, 2, 100);
    assert_eq!(log_records(&log_path(&dir)), original);
    assert_eq!(store.get("a"), Some(json!(1)));
    assert_eq!(store.get("b"), Some(json!(2)));

    // The next compaction simply overwrites the stray temp file.
    store.compact().unwrap();
    assert!(!tmp.exists());
}

#[test]
fn torn_append_keeps_valid_prefix_until_repaired() {
    let dir = TempDir::new().unwrap();

    {
        let store = store_in(&dir, 2, 100);
        store.set("a", &1).unwrap();
        store.set("b", &2).unwrap();
    }

    // Half a record at the tail, as a crash mid-append would leave.
    let mut text = std::fs::read_to_string(log_path(&dir)).unwrap();
    let clean_len = text.len() as u64;
    text.push_str("{\"c\": 3");
    std::fs::write(log_path(&dir), &text).unwrap();

    {
        let store = store_in(&dir, 2, 100);
        assert_eq!(store.keys(), vec!["a", "b"]);
    }

    let removed = Store::repair(log_path(&dir)).unwrap();
    assert!(removed > 0);
    assert_eq!(
        std::fs::metadata(log_path(&dir)).unwrap().len(),
        clean_len
    );

    let store = store_in(&dir, 2, 100);
    assert_eq!(store.keys(), vec!["a", "b"]);
}

#[test]
fn reserved_marker_key_is_refused_at_the_api() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 100, 100);
    store.set("a", &1).unwrap();

    // A reserved-key record cannot be encoded; the API refuses it
    // before it can ever poison a batch.
    assert!(store.set("__remove__", &1).is_err());

    store.flush().unwrap();
    assert_eq!(log_records(&log_path(&dir)).len(), 1);
}
